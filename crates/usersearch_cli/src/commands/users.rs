use clap::ValueEnum;
use usersearch::UserRecord;

/// Output format for user listings.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Display as a formatted table (default)
    #[default]
    Table,
    /// Display as JSON
    Json,
}

/// A user row for display.
#[derive(Debug, Clone, serde::Serialize, tabled::Tabled)]
pub(crate) struct UserRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Login")]
    pub login: String,
    #[tabled(rename = "Repos")]
    pub repo_count: i64,
    #[tabled(rename = "Avatar")]
    pub avatar_url: String,
}

impl From<&UserRecord> for UserRow {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            login: user.login.clone(),
            repo_count: user.repo_count,
            avatar_url: user.avatar_url.clone(),
        }
    }
}

impl UserRow {
    pub(crate) fn render(users: &[UserRecord], format: OutputFormat) -> Result<String, serde_json::Error> {
        let rows: Vec<Self> = users.iter().map(Self::from).collect();
        match format {
            OutputFormat::Table => {
                if rows.is_empty() {
                    return Ok("No users.".to_string());
                }
                let mut table = tabled::Table::new(rows);
                table.with(tabled::settings::Style::rounded());
                Ok(table.to_string())
            }
            OutputFormat::Json => serde_json::to_string_pretty(&rows),
        }
    }

    pub(crate) fn print_many(users: &[UserRecord], format: OutputFormat) -> Result<(), serde_json::Error> {
        println!("{}", Self::render(users, format)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<UserRecord> {
        vec![
            UserRecord::new(1, "kevin", "https://avatars/1").with_repo_count(5),
            UserRecord::new(2, "kevinh", "https://avatars/2"),
        ]
    }

    #[test]
    fn output_format_default_is_table() {
        assert!(matches!(OutputFormat::default(), OutputFormat::Table));
    }

    #[test]
    fn table_contains_headers_and_rows() {
        let table = UserRow::render(&sample(), OutputFormat::Table).unwrap();
        assert!(table.contains("Login"));
        assert!(table.contains("Repos"));
        assert!(table.contains("kevinh"));
    }

    #[test]
    fn empty_table_says_so() {
        assert_eq!(UserRow::render(&[], OutputFormat::Table).unwrap(), "No users.");
    }

    #[test]
    fn json_is_an_array_of_rows() {
        let json = UserRow::render(&sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["login"], "kevin");
        assert_eq!(value[0]["repo_count"], 5);
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }
}
