//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use std::io::Write;

    const YAML: &str = r#"
source:
  connection_string: "server=tcp:mssql,1433;database=Sales;user=sa;password=pw"
  schema: dbo
target:
  connection_string: "mysql://root:pw@mysql:3306/sales"
migration:
  insert_mode: literal
  strict_values: true
"#;

    #[test]
    fn test_from_yaml() {
        let config = Config::from_yaml(YAML).unwrap();
        assert_eq!(config.source.schema.as_deref(), Some("dbo"));
        assert_eq!(config.migration.insert_mode, InsertMode::Literal);
        assert!(config.migration.strict_values);
    }

    #[test]
    fn test_from_yaml_defaults_migration_section() {
        let yaml = r#"
source:
  connection_string: "server=tcp:mssql,1433;database=Sales"
target:
  connection_string: "mysql://root@mysql/sales"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.source.schema, None);
        assert_eq!(config.migration.insert_mode, InsertMode::Bound);
        assert!(!config.migration.strict_values);
    }

    #[test]
    fn test_from_yaml_rejects_unknown_insert_mode() {
        let yaml = YAML.replace("insert_mode: literal", "insert_mode: batched");
        assert!(matches!(Config::from_yaml(&yaml), Err(MigrateError::Yaml(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.migration.insert_mode, InsertMode::Literal);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/migrate.yaml"),
            Err(MigrateError::Io(_))
        ));
    }

    #[test]
    fn test_insert_mode_from_str() {
        assert_eq!("LITERAL".parse::<InsertMode>().unwrap(), InsertMode::Literal);
        assert_eq!("bound".parse::<InsertMode>().unwrap(), InsertMode::Bound);
        assert!("batch".parse::<InsertMode>().is_err());
        assert_eq!(InsertMode::Bound.to_string(), "bound");
    }
}
