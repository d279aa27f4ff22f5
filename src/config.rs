/*
 * Session-wide settings. Everything that used to be a process global (ID
 * bases, the class-name prefix, the reference DPI) is configured here and
 * owned by one `Session`, so independent sessions never share counters.
 */
use crate::dpi::REFERENCE_DPI;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::ids::{DEFAULT_FIRST_CONTROL_ID, DEFAULT_FIRST_SUBCLASS_ID};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Prefix of the window class registered for top-level windows.
    pub app_name: String,
    pub first_control_id: u16,
    pub first_subclass_id: usize,
    pub reference_dpi: u32,
    /// Route keyboard input through `IsDialogMessageW` so Tab moves focus.
    pub enable_dialog_navigation: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_name: "winctl".to_string(),
            first_control_id: DEFAULT_FIRST_CONTROL_ID,
            first_subclass_id: DEFAULT_FIRST_SUBCLASS_ID,
            reference_dpi: REFERENCE_DPI,
            enable_dialog_navigation: true,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> PlatformResult<()> {
        if self.app_name.trim().is_empty() {
            return Err(PlatformError::InitializationFailed(
                "SessionConfig: app_name must not be empty".to_string(),
            ));
        }
        if self.reference_dpi == 0 {
            return Err(PlatformError::InitializationFailed(
                "SessionConfig: reference_dpi must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Name of the class registered for this session's top-level windows.
    pub fn window_class_name(&self) -> String {
        format!("{}_WindowClass", self.app_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SessionConfig::default();
        config.validate().expect("defaults should validate");
        assert_eq!(config.first_control_id, 20000);
        assert_eq!(config.window_class_name(), "winctl_WindowClass");
    }

    #[test]
    fn empty_app_name_is_rejected() {
        let config = SessionConfig {
            app_name: "  ".to_string(),
            ..Default::default()
        };
        let err = config.validate().expect_err("blank name must fail");
        assert!(err.to_string().contains("app_name"));
    }

    #[test]
    fn zero_reference_dpi_is_rejected() {
        let config = SessionConfig {
            reference_dpi: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
