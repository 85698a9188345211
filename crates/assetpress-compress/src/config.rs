//! Backend selection.

use crate::closure_web::{ClosureWebCompressor, DEFAULT_CLOSURE_URL, DEFAULT_COMPILATION_LEVEL};
use crate::command::CommandCompressor;
use crate::cssmin::{CssminCompressor, DEFAULT_MAX_LINE_LEN};
use assetpress_core::AssetKind;
use assetpress_core::ports::Compressor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One compressor backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    Uglifyjs {
        #[serde(default = "default_node")]
        node: String,
        #[serde(default = "default_uglifyjs_bin")]
        bin: String,
        timeout_secs: Option<u64>,
    },
    ClosureJava {
        #[serde(default = "default_java")]
        java: String,
        jar: String,
        #[serde(default = "default_compilation_level")]
        compilation_level: String,
        timeout_secs: Option<u64>,
    },
    ClosureWeb {
        #[serde(default = "default_closure_url")]
        url: String,
        #[serde(default = "default_compilation_level")]
        compilation_level: String,
        timeout_secs: Option<u64>,
    },
    /// In-process stylesheet minifier.
    Cssmin {
        #[serde(default = "default_max_line_len")]
        max_line_len: usize,
    },
    /// Any stdin-to-stdout minifier.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        timeout_secs: Option<u64>,
    },
}

fn default_node() -> String {
    "node".to_string()
}

fn default_uglifyjs_bin() -> String {
    "node_modules/uglify-js/bin/uglifyjs".to_string()
}

fn default_java() -> String {
    "java".to_string()
}

fn default_compilation_level() -> String {
    DEFAULT_COMPILATION_LEVEL.to_string()
}

fn default_max_line_len() -> usize {
    DEFAULT_MAX_LINE_LEN
}

fn default_closure_url() -> String {
    DEFAULT_CLOSURE_URL.to_string()
}

impl BackendConfig {
    pub fn uglifyjs() -> Self {
        BackendConfig::Uglifyjs {
            node: default_node(),
            bin: default_uglifyjs_bin(),
            timeout_secs: None,
        }
    }

    pub fn cssmin() -> Self {
        BackendConfig::Cssmin {
            max_line_len: default_max_line_len(),
        }
    }

    pub fn command(program: impl Into<String>) -> Self {
        BackendConfig::Command {
            program: program.into(),
            args: vec![],
            timeout_secs: None,
        }
    }
}

/// Backends per asset kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorConfig {
    pub js: BackendConfig,
    pub css: BackendConfig,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            js: BackendConfig::uglifyjs(),
            css: BackendConfig::cssmin(),
        }
    }
}

/// Build a compressor. `debug` selects the pretty-printing flags.
pub fn create_compressor(config: &BackendConfig, debug: bool) -> Arc<dyn Compressor> {
    let with_timeout = |c: CommandCompressor, secs: &Option<u64>| match secs {
        Some(s) => c.with_timeout(Duration::from_secs(*s)),
        None => c,
    };

    match config {
        BackendConfig::Uglifyjs {
            node,
            bin,
            timeout_secs,
        } => Arc::new(with_timeout(
            CommandCompressor::uglifyjs(node, bin, debug),
            timeout_secs,
        )),
        BackendConfig::ClosureJava {
            java,
            jar,
            compilation_level,
            timeout_secs,
        } => Arc::new(with_timeout(
            CommandCompressor::closure_java(java, jar, compilation_level, debug),
            timeout_secs,
        )),
        BackendConfig::ClosureWeb {
            url,
            compilation_level,
            timeout_secs,
        } => {
            let c = ClosureWebCompressor::new(url, compilation_level, debug);
            Arc::new(match timeout_secs {
                Some(s) => c.with_timeout(Duration::from_secs(*s)),
                None => c,
            })
        }
        BackendConfig::Cssmin { max_line_len } => {
            Arc::new(CssminCompressor::new(*max_line_len, debug))
        }
        BackendConfig::Command {
            program,
            args,
            timeout_secs,
        } => Arc::new(with_timeout(
            CommandCompressor::new(program).with_args(args.iter().cloned()),
            timeout_secs,
        )),
    }
}

/// The compressor used for each asset kind.
#[derive(Clone)]
pub struct Compressors {
    js: Arc<dyn Compressor>,
    css: Arc<dyn Compressor>,
}

impl Compressors {
    pub fn new(js: Arc<dyn Compressor>, css: Arc<dyn Compressor>) -> Self {
        Self { js, css }
    }

    pub fn from_config(config: &CompressorConfig, debug: bool) -> Self {
        Self::new(
            create_compressor(&config.js, debug),
            create_compressor(&config.css, debug),
        )
    }

    pub fn for_kind(&self, kind: AssetKind) -> Arc<dyn Compressor> {
        match kind {
            AssetKind::Js => self.js.clone(),
            AssetKind::Css => self.css.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backends() {
        let config = CompressorConfig::default();
        let compressors = Compressors::from_config(&config, false);
        assert_eq!(compressors.for_kind(AssetKind::Js).name(), "uglifyjs");
        assert_eq!(compressors.for_kind(AssetKind::Css).name(), "cssmin");
    }

    #[test]
    fn test_backend_from_yaml() {
        let yaml = r#"
js:
  type: closure_java
  jar: /opt/closure/compiler.jar
css:
  type: command
  program: csso
  args: ["--comments", "none"]
  timeout_secs: 10
"#;
        let config: CompressorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.js,
            BackendConfig::ClosureJava {
                java: "java".to_string(),
                jar: "/opt/closure/compiler.jar".to_string(),
                compilation_level: "SIMPLE_OPTIMIZATIONS".to_string(),
                timeout_secs: None,
            }
        );
        assert!(matches!(config.css, BackendConfig::Command { timeout_secs: Some(10), .. }));

        let compressors = Compressors::from_config(&config, true);
        assert_eq!(compressors.for_kind(AssetKind::Js).name(), "closure_java");
        assert_eq!(compressors.for_kind(AssetKind::Css).name(), "csso");
    }

    #[tokio::test]
    async fn test_default_css_backend_runs_in_process() {
        let compressors = Compressors::from_config(&CompressorConfig::default(), false);
        let out = compressors
            .for_kind(AssetKind::Css)
            .compress("body {\n    color: red;\n}\n")
            .await
            .unwrap();
        assert_eq!(out, "body{color:red}");
    }

    #[test]
    fn test_cssmin_from_yaml() {
        let backend: BackendConfig = serde_yaml::from_str("type: cssmin").unwrap();
        assert_eq!(backend, BackendConfig::cssmin());
        let backend: BackendConfig =
            serde_yaml::from_str("type: cssmin\nmax_line_len: 0").unwrap();
        assert_eq!(backend, BackendConfig::Cssmin { max_line_len: 0 });
    }

    #[test]
    fn test_closure_web_backend() {
        let backend: BackendConfig = serde_yaml::from_str("type: closure_web").unwrap();
        assert_eq!(create_compressor(&backend, false).name(), "closure_web");
    }
}
