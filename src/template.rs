// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! OpenSSL-style request templates.
//!
//! A template is an `openssl req` configuration file. Rendering substitutes
//! [`HOSTNAME_PLACEHOLDER`] with the common name and replaces the body of the
//! `[ alt_names ]` section with the generated subject alternative names. The
//! rendered text is the declarative request handed to a crypto backend.

use crate::error::{Error, Result};
use crate::san::SanList;
use std::path::{Path, PathBuf};

/// Token replaced by the certificate's common name.
pub const HOSTNAME_PLACEHOLDER: &str = "@HostName@";

const ALT_NAMES_SECTION: &str = "alt_names";
const DEFAULT_DN_SECTION: &str = "req_distinguished_name";

/// A template loaded from disk.
#[derive(Debug, Clone)]
pub struct Template {
    path: PathBuf,
    text: String,
}

impl Template {
    /// Read the template, failing with [`Error::BadTemplate`] if it is missing,
    /// unreadable, not UTF-8 or empty.
    pub fn load(path: &Path) -> Result<Self> {
        let bad = |reason: String| Error::BadTemplate {
            path: path.to_path_buf(),
            reason,
        };

        if !path.is_file() {
            return Err(bad("file does not exist".into()));
        }
        let text = std::fs::read_to_string(path).map_err(|e| bad(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(bad("template is empty".into()));
        }

        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    pub fn from_text(path: &Path, text: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn render(&self, san: &SanList) -> RenderedTemplate {
        let substituted = self.text.replace(HOSTNAME_PLACEHOLDER, &san.common_name);

        let mut out = Vec::new();
        let mut in_alt_names = false;
        let mut found = false;

        for line in substituted.lines() {
            if let Some(name) = section_name(line) {
                in_alt_names = name == ALT_NAMES_SECTION;
                out.push(line.to_string());
                if in_alt_names {
                    found = true;
                    out.extend(san.sans.to_config_lines());
                }
                continue;
            }
            if !in_alt_names {
                out.push(line.to_string());
            }
        }

        if !found {
            log::warn!(
                "{} has no [ {} ] section; subject alternative names are not included",
                self.path.display(),
                ALT_NAMES_SECTION
            );
        }

        let mut text = out.join("\n");
        text.push('\n');
        RenderedTemplate {
            text,
            common_name: san.common_name.clone(),
        }
    }
}

/// A template with the common name and alternative names filled in.
#[derive(Debug, Clone)]
pub struct RenderedTemplate {
    text: String,
    common_name: String,
}

impl RenderedTemplate {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    /// Key/value pairs of a section, in file order. Empty if the section is absent.
    pub fn section(&self, wanted: &str) -> Vec<(String, String)> {
        let mut entries = Vec::new();
        let mut inside = false;
        for line in self.text.lines() {
            if let Some(name) = section_name(line) {
                inside = name == wanted;
                continue;
            }
            if !inside {
                continue;
            }
            let line = strip_comment(line).trim();
            if let Some((key, value)) = line.split_once('=') {
                entries.push((key.trim().to_string(), unquote(value.trim()).to_string()));
            }
        }
        entries
    }

    /// Entries of the distinguished name section named by `[ req ]`.
    pub fn distinguished_name(&self) -> Vec<(String, String)> {
        let section = self
            .section("req")
            .into_iter()
            .find(|(k, _)| k == "distinguished_name")
            .map(|(_, v)| v)
            .unwrap_or_else(|| DEFAULT_DN_SECTION.to_string());
        self.section(&section)
    }

    /// Entries of the `[ alt_names ]` section.
    pub fn alt_names(&self) -> Vec<(String, String)> {
        self.section(ALT_NAMES_SECTION)
    }
}

fn section_name(line: &str) -> Option<&str> {
    let line = strip_comment(line).trim();
    line.strip_prefix('[')?.strip_suffix(']').map(str::trim)
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or(line)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::san::{SanSet, SubjectAltName};

    const TEMPLATE: &str = "\
[ req ]
prompt = no
distinguished_name = dn

[ dn ]
commonName = @HostName@   # substituted
organizationName = \"Example Org\"

[ alt_names ]
DNS.1 = stale.example
DNS.2 = other.example

[ trailer ]
keep = yes
";

    fn san_list() -> SanList {
        let mut sans = SanSet::new();
        sans.insert(SubjectAltName::Dns("web.example".into()));
        sans.insert(SubjectAltName::Dns("example".into()));
        sans.insert(SubjectAltName::Ip("10.0.0.1".parse().expect("valid ip")));
        SanList {
            common_name: "web.example".into(),
            sans,
        }
    }

    #[test]
    fn test_render_replaces_alt_names() {
        let rendered = Template::from_text(Path::new("t.cnf"), TEMPLATE).render(&san_list());
        let text = rendered.text();

        assert!(!text.contains("stale.example"));
        assert!(!text.contains("other.example"));
        assert!(text.contains("DNS.1 = web.example"));
        assert!(text.contains("DNS.2 = example"));
        assert!(text.contains("IP.1 = 10.0.0.1"));
        // Sections after alt_names survive
        assert!(text.contains("keep = yes"));
        assert!(!text.contains(HOSTNAME_PLACEHOLDER));
    }

    #[test]
    fn test_parsed_sections() {
        let rendered = Template::from_text(Path::new("t.cnf"), TEMPLATE).render(&san_list());

        assert_eq!(
            rendered.distinguished_name(),
            vec![
                ("commonName".to_string(), "web.example".to_string()),
                ("organizationName".to_string(), "Example Org".to_string()),
            ]
        );
        assert_eq!(rendered.alt_names().len(), 3);
        assert_eq!(rendered.section("trailer"), vec![("keep".into(), "yes".into())]);
        assert!(rendered.section("missing").is_empty());
    }

    #[test]
    fn test_render_without_alt_names_section() {
        let text = "[ req ]\ndistinguished_name = dn\n[ dn ]\nCN = @HostName@\n";
        let rendered = Template::from_text(Path::new("t.cnf"), text).render(&san_list());
        assert!(rendered.alt_names().is_empty());
        assert!(rendered.text().contains("CN = web.example"));
    }

    #[test]
    fn test_default_dn_section() {
        let text = "[ req_distinguished_name ]\nCN = @HostName@\n";
        let rendered = Template::from_text(Path::new("t.cnf"), text).render(&san_list());
        assert_eq!(
            rendered.distinguished_name(),
            vec![("CN".to_string(), "web.example".to_string())]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().expect("temp directory should be created");
        let result = Template::load(&dir.path().join("absent.cnf"));
        assert!(matches!(result, Err(Error::BadTemplate { .. })));
    }

    #[test]
    fn test_load_directory_rejected() {
        let dir = tempfile::tempdir().expect("temp directory should be created");
        assert!(matches!(
            Template::load(dir.path()),
            Err(Error::BadTemplate { .. })
        ));
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().expect("temp directory should be created");
        let path = dir.path().join("empty.cnf");
        std::fs::write(&path, "\n  \n").expect("template should be written");
        assert!(matches!(Template::load(&path), Err(Error::BadTemplate { .. })));
    }

    #[test]
    fn test_shipped_template_renders() {
        let text = include_str!("../templates/localcert.cnf");
        let rendered = Template::from_text(Path::new("localcert.cnf"), text).render(&san_list());
        assert_eq!(
            rendered.distinguished_name(),
            vec![("commonName".to_string(), "web.example".to_string())]
        );
        assert_eq!(rendered.alt_names().len(), 3);
    }
}
