//! Module `commands`
//!
//! Defines the portal's line commands, their parsing, and the structures
//! used to report the outcome of executing them.
//!
//! A command line is a verb followed by `|`-separated arguments, so that
//! catalog names may contain spaces: `COURSES Example University|Semester 1`.

use crate::storage::Category;

/// Addresses one category folder of one course.
#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub university: String,
    pub semester: String,
    pub course: String,
    pub category: Category,
}

/// Represents a command parsed from the client input.
///
/// Read commands are open to everyone; the rest need an admin session.
#[derive(Debug, PartialEq)]
pub enum Command {
    QUIT,
    HELP,
    LOGIN(String, String), // username, password
    LOGOUT,
    UNIS,
    SEMS(String),
    COURSES(String, String),
    FILES(Folder),
    GET(Folder, String),
    ADDUNI(String),
    DELUNI(String),
    ADDSEM(String, String),
    DELSEM(String, String),
    ADDCOURSE(String, String, String),
    DELCOURSE(String, String, String),
    PUT(Folder, String, String),    // filename, base64 content
    RENAME(Folder, String, String), // old name, new name
    DEL(Folder, String),
    UNKNOWN,
}

impl Command {
    /// Whether the command changes the catalog or its files
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::ADDUNI(_)
                | Command::DELUNI(_)
                | Command::ADDSEM(..)
                | Command::DELSEM(..)
                | Command::ADDCOURSE(..)
                | Command::DELCOURSE(..)
                | Command::PUT(..)
                | Command::RENAME(..)
                | Command::DEL(..)
        )
    }
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
}

/// Split `arg` into exactly `n` trimmed parts; the last part keeps any `|`.
fn split_args(arg: &str, n: usize) -> Option<Vec<String>> {
    let parts: Vec<String> = arg.splitn(n, '|').map(|p| p.trim().to_string()).collect();
    (parts.len() == n).then_some(parts)
}

/// Build a folder from the first four arguments, returning the remainder.
fn folder_args(arg: &str, extra: usize) -> Option<(Folder, Vec<String>)> {
    let mut parts = split_args(arg, 4 + extra)?;
    let rest = parts.split_off(4);
    let [university, semester, course, category]: [String; 4] = parts.try_into().ok()?;
    let folder = Folder {
        university,
        semester,
        course,
        category: category.parse().ok()?,
    };
    Some((folder, rest))
}

/// Parses a raw command string received from a client into the `Command` enum.
///
/// Returns `UNKNOWN` for unknown verbs and for known verbs with the wrong
/// number of arguments or an unknown category.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();

    let parsed = match cmd.as_str() {
        "QUIT" | "Q" => Some(Command::QUIT),
        "HELP" => Some(Command::HELP),
        "LOGOUT" => Some(Command::LOGOUT),
        "UNIS" => Some(Command::UNIS),
        "LOGIN" => split_args(arg, 2).map(|mut a| {
            let password = a.pop().unwrap_or_default();
            let username = a.pop().unwrap_or_default();
            Command::LOGIN(username, password)
        }),
        "SEMS" if !arg.is_empty() => Some(Command::SEMS(arg.to_string())),
        "COURSES" => split_args(arg, 2).map(|mut a| {
            let semester = a.pop().unwrap_or_default();
            let university = a.pop().unwrap_or_default();
            Command::COURSES(university, semester)
        }),
        "FILES" => folder_args(arg, 0).map(|(folder, _)| Command::FILES(folder)),
        "GET" => folder_args(arg, 1).map(|(folder, mut rest)| {
            Command::GET(folder, rest.pop().unwrap_or_default())
        }),
        "ADDUNI" if !arg.is_empty() => Some(Command::ADDUNI(arg.to_string())),
        "DELUNI" if !arg.is_empty() => Some(Command::DELUNI(arg.to_string())),
        "ADDSEM" | "DELSEM" => split_args(arg, 2).map(|mut a| {
            let name = a.pop().unwrap_or_default();
            let university = a.pop().unwrap_or_default();
            if cmd == "ADDSEM" {
                Command::ADDSEM(university, name)
            } else {
                Command::DELSEM(university, name)
            }
        }),
        "ADDCOURSE" | "DELCOURSE" => split_args(arg, 3).map(|mut a| {
            let name = a.pop().unwrap_or_default();
            let semester = a.pop().unwrap_or_default();
            let university = a.pop().unwrap_or_default();
            if cmd == "ADDCOURSE" {
                Command::ADDCOURSE(university, semester, name)
            } else {
                Command::DELCOURSE(university, semester, name)
            }
        }),
        "PUT" => folder_args(arg, 2).map(|(folder, mut rest)| {
            let content = rest.pop().unwrap_or_default();
            let filename = rest.pop().unwrap_or_default();
            Command::PUT(folder, filename, content)
        }),
        "RENAME" => folder_args(arg, 2).map(|(folder, mut rest)| {
            let new_name = rest.pop().unwrap_or_default();
            let old_name = rest.pop().unwrap_or_default();
            Command::RENAME(folder, old_name, new_name)
        }),
        "DEL" => folder_args(arg, 1).map(|(folder, mut rest)| {
            Command::DEL(folder, rest.pop().unwrap_or_default())
        }),
        _ => None,
    };

    parsed.unwrap_or(Command::UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(category: Category) -> Folder {
        Folder {
            university: "Example University".into(),
            semester: "Semester 1".into(),
            course: "Calculus I".into(),
            category,
        }
    }

    #[test]
    fn parses_names_with_spaces() {
        assert_eq!(
            parse_command("courses Example University | Semester 1\r\n"),
            Command::COURSES("Example University".into(), "Semester 1".into())
        );
        assert_eq!(
            parse_command("ADDUNI  Example University "),
            Command::ADDUNI("Example University".into())
        );
    }

    #[test]
    fn parses_folder_commands() {
        assert_eq!(
            parse_command("FILES Example University|Semester 1|Calculus I|exams"),
            Command::FILES(folder(Category::Exams))
        );
        assert_eq!(
            parse_command("RENAME Example University|Semester 1|Calculus I|tips|a.pdf|b"),
            Command::RENAME(folder(Category::Tips), "a.pdf".into(), "b".into())
        );
        assert_eq!(
            parse_command("PUT Example University|Semester 1|Calculus I|sheets|s.txt|aGk="),
            Command::PUT(folder(Category::Sheets), "s.txt".into(), "aGk=".into())
        );
    }

    #[test]
    fn wrong_arity_or_category_is_unknown() {
        assert_eq!(parse_command("COURSES OnlyOne"), Command::UNKNOWN);
        assert_eq!(parse_command("FILES A|S|C|videos"), Command::UNKNOWN);
        assert_eq!(parse_command("ADDUNI"), Command::UNKNOWN);
        assert_eq!(parse_command("FROB"), Command::UNKNOWN);
    }

    #[test]
    fn mutations_require_admin() {
        assert!(parse_command("DELUNI A").requires_admin());
        assert!(!parse_command("UNIS").requires_admin());
        assert!(!parse_command("GET A|S|C|exams|f.pdf").requires_admin());
    }
}
