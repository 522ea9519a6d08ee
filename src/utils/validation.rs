use crate::utils::error::{EtlError, Result};
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// Inputs may be directories (no extension) or files; files must carry
/// one of the allowed extensions, compared case-insensitively.
pub fn validate_input_paths(field_name: &str, inputs: &[String], allowed_extensions: &[&str]) -> Result<()> {
    if inputs.is_empty() {
        return Err(EtlError::MissingConfigError {
            field: field_name.to_string(),
        });
    }

    for input in inputs {
        validate_path(field_name, input)?;

        let extension = Path::new(input).extension().and_then(|ext| ext.to_str());
        if let Some(extension) = extension {
            let allowed = allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(extension));
            if !allowed {
                return Err(EtlError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: input.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
        }
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Report names end up as file names inside the output directory.
pub fn validate_file_stem(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be a plain file name without path separators".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output_path", "./output").is_ok());
        assert!(validate_path("output_path", "").is_err());
        assert!(validate_path("output_path", "   ").is_err());
        assert!(validate_path("output_path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_input_paths() {
        let inputs = vec!["notas/".to_string(), "nota.xml".to_string(), "NOTA.XML".to_string()];
        assert!(validate_input_paths("inputs", &inputs, &["xml"]).is_ok());

        let invalid = vec!["planilha.csv".to_string()];
        assert!(validate_input_paths("inputs", &invalid, &["xml"]).is_err());

        assert!(matches!(
            validate_input_paths("inputs", &[], &["xml"]),
            Err(EtlError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_validate_file_stem() {
        assert!(validate_file_stem("report_name", "relatorio_fiscal").is_ok());
        assert!(validate_file_stem("report_name", "").is_err());
        assert!(validate_file_stem("report_name", "../escape").is_err());
    }
}
