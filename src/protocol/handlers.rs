//! Command handlers module for the StudyHub portal.
//!
//! This module defines handler functions for each command, translating them
//! into catalog service calls and formatting the outcome as a response.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{info, warn};

use crate::auth::Authenticator;
use crate::catalog::RemovalReport;
use crate::client::Session;
use crate::error::handlers::{auth_error_code, error_code};
use crate::error::{AuthError, CatalogError};
use crate::protocol::responses::{self, format_listing, format_response};
use crate::protocol::{Command, CommandResult, CommandStatus, Folder};
use crate::service::CatalogService;

const HELP_TEXT: [&str; 19] = [
    "UNIS",
    "SEMS <university>",
    "COURSES <university>|<semester>",
    "FILES <university>|<semester>|<course>|<exams|sheets|tips>",
    "GET <university>|<semester>|<course>|<category>|<file>",
    "LOGIN <username>|<password>",
    "LOGOUT",
    "QUIT",
    "HELP",
    "Admin only:",
    "ADDUNI <name>",
    "DELUNI <name>",
    "ADDSEM <university>|<name>",
    "DELSEM <university>|<name>",
    "ADDCOURSE <university>|<semester>|<name>",
    "DELCOURSE <university>|<semester>|<name>",
    "PUT <university>|<semester>|<course>|<category>|<file>|<base64>",
    "RENAME <university>|<semester>|<course>|<category>|<old>|<new>",
    "DEL <university>|<semester>|<course>|<category>|<file>",
];

fn success(message: String) -> CommandResult {
    CommandResult {
        status: CommandStatus::Success,
        message: Some(message),
    }
}

fn failure(code: u16, reason: String) -> CommandResult {
    CommandResult {
        message: Some(format_response(code, &reason)),
        status: CommandStatus::Failure(reason),
    }
}

fn catalog_failure(err: CatalogError) -> CommandResult {
    failure(error_code(&err), err.to_string())
}

fn auth_failure(err: AuthError) -> CommandResult {
    failure(auth_error_code(&err), err.to_string())
}

/// Report a mutation, noting when it could not be saved to disk.
fn mutation_result(outcome: Result<(), CatalogError>, done: String) -> CommandResult {
    match outcome {
        Ok(()) => success(format_response(responses::ACTION_OK, &done)),
        Err(err @ CatalogError::StoreError(_)) => failure(
            error_code(&err),
            format!("{}; {} (kept until the next successful save)", done, err),
        ),
        Err(err) => catalog_failure(err),
    }
}

fn removal_result(outcome: Result<RemovalReport, CatalogError>, done: String) -> CommandResult {
    match outcome {
        Ok(report) if report.is_clean() => success(format_response(
            responses::ACTION_OK,
            &format!("{} ({} courses)", done, report.courses_removed),
        )),
        Ok(report) => success(format_response(
            responses::ACTION_OK,
            &format!(
                "{} ({} courses; {} folders could not be removed)",
                done,
                report.courses_removed,
                report.failures.len()
            ),
        )),
        Err(err) => mutation_result(Err(err), done),
    }
}

/// Dispatches a received command to its corresponding handler.
///
/// Mutating commands are refused unless the session has logged in as admin.
pub fn handle_command(
    service: &mut CatalogService,
    session: &mut Session,
    auth: &dyn Authenticator,
    command: &Command,
) -> CommandResult {
    if command.requires_admin() && !session.is_admin() {
        warn!("Refused admin command from {}", session.peer());
        return auth_failure(AuthError::NotAuthorized);
    }

    match command {
        Command::QUIT => handle_cmd_quit(session),
        Command::HELP => success(format_listing(responses::HELP, HELP_TEXT)),
        Command::LOGIN(username, password) => handle_cmd_login(session, auth, username, password),
        Command::LOGOUT => handle_cmd_logout(session),
        Command::UNIS => success(format_listing(responses::LISTING, service.universities())),
        Command::SEMS(university) => handle_cmd_sems(service, university),
        Command::COURSES(university, semester) => handle_cmd_courses(service, university, semester),
        Command::FILES(folder) => handle_cmd_files(service, folder),
        Command::GET(folder, filename) => handle_cmd_get(service, folder, filename),
        Command::ADDUNI(name) => mutation_result(
            service.add_university(name),
            format!("Added {} to universities", name),
        ),
        Command::DELUNI(name) => removal_result(
            service.remove_university(name),
            format!("Removed university {}", name),
        ),
        Command::ADDSEM(university, name) => mutation_result(
            service.add_semester(university, name),
            format!("Added {} to {} semesters", name, university),
        ),
        Command::DELSEM(university, name) => removal_result(
            service.remove_semester(university, name),
            format!("Removed semester {} of {}", name, university),
        ),
        Command::ADDCOURSE(university, semester, name) => mutation_result(
            service.add_course(university, semester, name),
            format!("Added {} to {}, {} courses", name, university, semester),
        ),
        Command::DELCOURSE(university, semester, name) => removal_result(
            service.remove_course(university, semester, name),
            format!("Removed course {} of {}, {}", name, university, semester),
        ),
        Command::PUT(folder, filename, content) => handle_cmd_put(service, folder, filename, content),
        Command::RENAME(folder, old_name, new_name) => {
            handle_cmd_rename(service, folder, old_name, new_name)
        }
        Command::DEL(folder, filename) => handle_cmd_del(service, folder, filename),
        Command::UNKNOWN => failure(
            responses::UNKNOWN_COMMAND,
            "Unknown command or bad arguments, try HELP".into(),
        ),
    }
}

/// Handles the QUIT command: drops admin rights and signals connection close.
fn handle_cmd_quit(session: &mut Session) -> CommandResult {
    session.logout();
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(format_response(responses::GOODBYE, "Goodbye")),
    }
}

/// Handles the LOGIN command by consulting the authenticator.
fn handle_cmd_login(
    session: &mut Session,
    auth: &dyn Authenticator,
    username: &str,
    password: &str,
) -> CommandResult {
    match auth.authorize(username, password) {
        Ok(()) => {
            session.login(username);
            info!("Admin {} logged in from {}", username, session.peer());
            success(format_response(responses::LOGIN_SUCCESS, "Logged in as admin"))
        }
        Err(e) => {
            warn!("Rejected login for {:?} from {}: {}", username, session.peer(), e);
            session.logout();
            auth_failure(e)
        }
    }
}

fn handle_cmd_logout(session: &mut Session) -> CommandResult {
    if session.is_admin() {
        info!(
            "Admin {} logged out from {}",
            session.username().unwrap_or_default(),
            session.peer()
        );
        session.logout();
        success(format_response(responses::OK, "Logged out"))
    } else {
        auth_failure(AuthError::NotAuthorized)
    }
}

fn handle_cmd_sems(service: &CatalogService, university: &str) -> CommandResult {
    if !service.catalog().has_university(university) {
        return catalog_failure(CatalogError::NotFound(university.to_string()));
    }
    success(format_listing(responses::LISTING, service.semesters(university)))
}

fn handle_cmd_courses(service: &CatalogService, university: &str, semester: &str) -> CommandResult {
    if !service.catalog().has_semester(university, semester) {
        return catalog_failure(CatalogError::NotFound(format!(
            "{}, {}",
            university, semester
        )));
    }
    success(format_listing(
        responses::LISTING,
        service.courses(university, semester),
    ))
}

/// Handles the FILES command: one line per file with size, date and kind.
fn handle_cmd_files(service: &CatalogService, folder: &Folder) -> CommandResult {
    match service.list_resources(
        &folder.university,
        &folder.semester,
        &folder.course,
        folder.category,
    ) {
        Ok(files) => success(format_listing(
            responses::LISTING,
            files.iter().map(|file| {
                format!(
                    "{}\t{:.1} KB\t{}\t{:?}",
                    file.name,
                    file.size_kb(),
                    file.uploaded_on(),
                    file.kind()
                )
            }),
        )),
        Err(e) => catalog_failure(e),
    }
}

/// Handles the GET command: the file travels base64-encoded on one line.
fn handle_cmd_get(service: &CatalogService, folder: &Folder, filename: &str) -> CommandResult {
    match service.read_resource(
        &folder.university,
        &folder.semester,
        &folder.course,
        folder.category,
        filename,
    ) {
        Ok(content) => {
            let header = format!(
                "Sending {} ({:.1} KB, uploaded {})",
                content.file.name,
                content.file.size_kb(),
                content.file.uploaded_on()
            );
            let mut message = format!("{}-{}\r\n", responses::SENDING, header);
            message.push_str(&format!(
                "{}-{}\r\n",
                responses::SENDING,
                STANDARD.encode(&content.bytes)
            ));
            message.push_str(&format_response(
                responses::TRANSFER_COMPLETE,
                "Transfer complete",
            ));
            success(message)
        }
        Err(e) => catalog_failure(e),
    }
}

/// Handles the PUT command: decodes the base64 body and stores it.
fn handle_cmd_put(
    service: &CatalogService,
    folder: &Folder,
    filename: &str,
    content: &str,
) -> CommandResult {
    let bytes = match STANDARD.decode(content) {
        Ok(bytes) => bytes,
        Err(e) => {
            return failure(
                responses::SYNTAX_ERROR,
                format!("File content is not valid base64: {}", e),
            );
        }
    };

    match service.upload_resource(
        &folder.university,
        &folder.semester,
        &folder.course,
        folder.category,
        filename,
        &bytes,
    ) {
        Ok(file) => success(format_response(
            responses::TRANSFER_COMPLETE,
            &format!(
                "File {} uploaded successfully ({} bytes)",
                file.name, file.size
            ),
        )),
        Err(e) => catalog_failure(e),
    }
}

fn handle_cmd_rename(
    service: &CatalogService,
    folder: &Folder,
    old_name: &str,
    new_name: &str,
) -> CommandResult {
    match service.rename_resource(
        &folder.university,
        &folder.semester,
        &folder.course,
        folder.category,
        old_name,
        new_name,
    ) {
        Ok(final_name) => success(format_response(
            responses::ACTION_OK,
            &format!("Renamed {} to {}", old_name, final_name),
        )),
        Err(e) => catalog_failure(e),
    }
}

fn handle_cmd_del(service: &CatalogService, folder: &Folder, filename: &str) -> CommandResult {
    match service.delete_resource(
        &folder.university,
        &folder.semester,
        &folder.course,
        folder.category,
        filename,
    ) {
        Ok(()) => success(format_response(
            responses::ACTION_OK,
            &format!("Deleted {}", filename),
        )),
        Err(e) => catalog_failure(e),
    }
}
