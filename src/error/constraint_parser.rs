use regex::Regex;
use std::sync::OnceLock;

/// Extracts table, column and value names from PostgreSQL constraint
/// violation messages.
///
/// The reservation tables carry underscores in their names
/// (`prenotazioni_materiali`), so a constraint name alone is ambiguous. The
/// parser prefers the quoted names in the message and only falls back to
/// splitting the constraint name on the table it reports.
pub struct ConstraintParser;

struct RegexPatterns {
    key_value: Regex,
    column_name: Regex,
    table_name: Regex,
    relation_name: Regex,
}

impl RegexPatterns {
    fn new() -> Option<Self> {
        Some(Self {
            // "Key (materiale_id)=(99)"
            key_value: Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").ok()?,
            column_name: Regex::new(r#"column "([^"]+)""#).ok()?,
            table_name: Regex::new(r#"table "([^"]+)""#).ok()?,
            relation_name: Regex::new(r#"relation "([^"]+)""#).ok()?,
        })
    }
}

static REGEX_PATTERNS: OnceLock<Option<RegexPatterns>> = OnceLock::new();

fn capture(pattern: impl Fn(&RegexPatterns) -> &Regex, message: &str) -> Option<String> {
    let patterns = REGEX_PATTERNS.get_or_init(RegexPatterns::new).as_ref()?;
    pattern(patterns)
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

impl ConstraintParser {
    /// Returns `(table, column, referenced value)` for a foreign key violation.
    ///
    /// `insert or update on table "prenotazioni_materiali" violates foreign key
    /// constraint "prenotazioni_materiali_materiale_id_fkey" DETAIL: Key
    /// (materiale_id)=(99) is not present in table "materiali".`
    pub fn parse_foreign_key_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let table = Self::extract_table_from_message(message);

        if let Some((field, value)) = Self::extract_key_value_from_message(message) {
            return Some((table.unwrap_or_else(|| "resource".to_string()), field, value));
        }

        let constraint = constraint_name?;
        let table = table?;
        let field = Self::column_from_constraint(constraint, &table, "_fkey")?;
        Some((table, field, "invalid_reference".to_string()))
    }

    /// Returns `(table, column)` for a check constraint violation such as
    /// `prenotazioni_materiali_quantita_check`.
    pub fn parse_check_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        let table = Self::extract_relation_from_message(message)
            .or_else(|| Self::extract_table_from_message(message));

        if let (Some(constraint), Some(table)) = (constraint_name, table.as_ref()) {
            if let Some(field) = Self::column_from_constraint(constraint, table, "_check") {
                return Some((table.clone(), field));
            }
        }

        let field = Self::extract_column_from_message(message)?;
        Some((table.unwrap_or_else(|| "resource".to_string()), field))
    }

    /// Returns `(table, column)` for a not-null violation
    pub fn parse_not_null_violation(message: &str) -> Option<(String, String)> {
        let field = Self::extract_column_from_message(message)?;
        let table = Self::extract_relation_from_message(message)
            .unwrap_or_else(|| "resource".to_string());
        Some((table, field))
    }

    /// Strips `<table>_` and `suffix` from a constraint name
    pub fn column_from_constraint(constraint: &str, table: &str, suffix: &str) -> Option<String> {
        let field = constraint
            .strip_prefix(table)?
            .strip_prefix('_')?
            .strip_suffix(suffix)?;
        (!field.is_empty()).then(|| field.to_string())
    }

    pub fn extract_column_from_message(message: &str) -> Option<String> {
        capture(|p| &p.column_name, message)
    }

    pub fn extract_table_from_message(message: &str) -> Option<String> {
        capture(|p| &p.table_name, message)
    }

    pub fn extract_relation_from_message(message: &str) -> Option<String> {
        capture(|p| &p.relation_name, message)
    }

    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        let patterns = REGEX_PATTERNS.get_or_init(RegexPatterns::new).as_ref()?;
        patterns.key_value.captures(message).and_then(|caps| {
            let field = caps.get(1)?.as_str().to_string();
            let value = caps.get(2)?.as_str().to_string();
            Some((field, value))
        })
    }
}
