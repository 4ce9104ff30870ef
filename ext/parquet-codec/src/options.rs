use serde::{Deserialize, Serialize};

/// Default number of idle buffers each pool keeps for reuse
pub const DEFAULT_POOL_RETENTION: usize = 64;

/// Options that influence codec resolution and decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Decode un-annotated BYTE_ARRAY columns as strings
    pub treat_byte_array_as_string: bool,
    /// Replace invalid UTF-8 in string columns instead of failing
    pub lossy_utf8: bool,
    /// Maximum idle buffers retained per array pool
    pub pool_retention: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            treat_byte_array_as_string: false,
            lossy_utf8: false,
            pool_retention: DEFAULT_POOL_RETENTION,
        }
    }
}

impl FormatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_treat_byte_array_as_string(mut self, enabled: bool) -> Self {
        self.treat_byte_array_as_string = enabled;
        self
    }

    pub fn with_lossy_utf8(mut self, enabled: bool) -> Self {
        self.lossy_utf8 = enabled;
        self
    }

    pub fn with_pool_retention(mut self, retention: usize) -> Self {
        self.pool_retention = retention;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = FormatOptions::default();
        assert!(!options.treat_byte_array_as_string);
        assert!(!options.lossy_utf8);
        assert_eq!(options.pool_retention, DEFAULT_POOL_RETENTION);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: FormatOptions =
            serde_json::from_str(r#"{"treat_byte_array_as_string": true}"#).unwrap();
        assert!(options.treat_byte_array_as_string);
        assert_eq!(options.pool_retention, DEFAULT_POOL_RETENTION);

        let json = serde_json::to_string(&options.with_lossy_utf8(true)).unwrap();
        let back: FormatOptions = serde_json::from_str(&json).unwrap();
        assert!(back.lossy_utf8);
    }
}
