//! diary: command-line front end for the diary core.
//!
//! Works on the same database and preference files as the app, resolved
//! from `DIARY_*` environment variables or `--data-dir`.

use clap::{Parser, Subcommand};
use diary_core::model::images::{segment_content, ContentSegment};
use diary_core::prefs::font_repo::{FontRepository, FONT_STORE_NAME};
use diary_core::prefs::login_repo::{LoginRepository, LOGIN_STORE_NAME};
use diary_core::service::backup_service::GOOGLE_ID_TOKEN_CREDENTIAL_TYPE;
use diary_core::{
    format_date, open_db, parse_date_input, BackupService, DiaryConfig, DriveBackupProvider,
    DriveUiState, FilePreferenceStore, FontFamily, FontService, LoginState, NoteDraft,
    NoteService, SignInCredential, SqliteNoteRepository,
};
use log::warn;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "diary")]
#[command(author, version, about = "Date-keyed diary notes with JSON backups")]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding the database, preferences and logs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List notes, oldest date first
    List,

    /// Print one note
    Show {
        /// Note id
        id: i64,
    },

    /// Create a note
    Add {
        /// Day of the entry (YYYY-MM-DD or YYYYMMDD, default: today)
        #[arg(short, long)]
        date: Option<String>,

        /// Note title
        #[arg(short, long)]
        title: String,

        /// Note body
        #[arg(short, long, default_value = "")]
        content: String,
    },

    /// Delete a note
    Delete {
        /// Note id
        id: i64,
    },

    /// Delete every note
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Write every note as backup JSON (stdout when no file is given)
    Export {
        /// Output file
        file: Option<PathBuf>,
    },

    /// Replace every note with the contents of a backup JSON file
    Import {
        /// Backup file
        file: PathBuf,
    },

    /// Show or change the display font
    Font {
        /// Family: Default, Serif or Monospace
        #[arg(short, long)]
        family: Option<String>,

        /// Size in points (12-24)
        #[arg(short, long)]
        size: Option<f32>,
    },

    /// Sign in to Google Drive, back up and restore
    Backup {
        #[command(subcommand)]
        action: BackupAction,

        /// OAuth access token with the drive.appdata scope
        #[arg(short, long, global = true)]
        token: Option<String>,
    },
}

#[derive(Subcommand)]
enum BackupAction {
    /// Save a Google sign-in for later backup commands
    Login {
        /// Google account id
        #[arg(short, long)]
        account: String,

        /// ID token from the Google sign-in
        #[arg(long)]
        id_token: String,

        /// Display name of the account
        #[arg(short, long)]
        name: String,
    },
    /// Forget the saved sign-in
    Logout,
    /// Upload every note as a new backup
    Upload,
    /// Replace local notes with the newest backup
    Restore,
    /// List backups, newest first
    List,
    /// Delete one backup
    Delete {
        /// Drive file id
        id: String,
    },
}

type DriveSession<'conn> =
    BackupService<SqliteNoteRepository<'conn>, FilePreferenceStore, DriveBackupProvider>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(cli.data_dir.as_deref())?;
    if let Err(err) = diary_core::logging::init_logging_from_config(&config) {
        eprintln!("warning: logging disabled: {err}");
    }

    match cli.command {
        Commands::List => cmd_list(&config)?,
        Commands::Show { id } => cmd_show(&config, id)?,
        Commands::Add {
            date,
            title,
            content,
        } => cmd_add(&config, date.as_deref(), title, content)?,
        Commands::Delete { id } => cmd_delete(&config, id)?,
        Commands::Clear { yes } => cmd_clear(&config, yes)?,
        Commands::Export { file } => cmd_export(&config, file.as_deref())?,
        Commands::Import { file } => cmd_import(&config, &file)?,
        Commands::Font { family, size } => cmd_font(&config, family.as_deref(), size)?,
        Commands::Backup { action, token } => cmd_backup(&config, action, token)?,
    }
    Ok(())
}

fn resolve_config(data_dir: Option<&Path>) -> Result<DiaryConfig, Box<dyn std::error::Error>> {
    let config = match data_dir {
        Some(dir) if dir.is_absolute() => DiaryConfig::with_data_dir(dir),
        Some(dir) => DiaryConfig::with_data_dir(std::env::current_dir()?.join(dir)),
        None => DiaryConfig::from_env(),
    };
    config.ensure_dirs()?;
    Ok(config)
}

fn with_notes<T>(
    config: &DiaryConfig,
    f: impl FnOnce(
        &mut NoteService<SqliteNoteRepository<'_>>,
    ) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    let mut conn = open_db(&config.db_path)?;
    let mut service = NoteService::new(SqliteNoteRepository::try_new(&mut conn)?);
    f(&mut service)
}

fn cmd_list(config: &DiaryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let briefs = with_notes(config, |notes| Ok(notes.list_note_briefs()?))?;
    if briefs.is_empty() {
        println!("No notes yet.");
        return Ok(());
    }
    for brief in briefs {
        println!("{:>6}  {}  {}", brief.id, format_date(brief.date), brief.title);
    }
    Ok(())
}

fn cmd_show(config: &DiaryConfig, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let note = with_notes(config, |notes| Ok(notes.get_note(id)?))?
        .ok_or_else(|| format!("note {id} not found"))?;

    println!("{}  {}", format_date(note.date), note.title);
    println!();
    for segment in segment_content(&note.content, &note.image_uris) {
        match segment {
            ContentSegment::Text(text) => print!("{text}"),
            ContentSegment::Image { uri, .. } => print!("<image {uri}>"),
        }
    }
    println!();
    Ok(())
}

fn cmd_add(
    config: &DiaryConfig,
    date: Option<&str>,
    title: String,
    content: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let date = match date {
        Some(raw) => parse_date_input(raw).ok_or_else(|| format!("invalid date `{raw}`"))?,
        None => diary_core::model::date::today(),
    };
    let draft = NoteDraft {
        date,
        title,
        content,
        ..NoteDraft::default()
    };
    let note = with_notes(config, |notes| Ok(notes.create_note(&draft)?))?;
    println!("Created note {} for {}", note.id, format_date(note.date));
    Ok(())
}

fn cmd_delete(config: &DiaryConfig, id: i64) -> Result<(), Box<dyn std::error::Error>> {
    with_notes(config, |notes| Ok(notes.delete_note(id)?))?;
    println!("Deleted note {id}");
    Ok(())
}

fn cmd_clear(config: &DiaryConfig, yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !yes {
        return Err("refusing to delete every note without --yes".into());
    }
    let removed = with_notes(config, |notes| Ok(notes.delete_all_notes()?))?;
    println!("Deleted {removed} note(s)");
    Ok(())
}

fn cmd_export(config: &DiaryConfig, file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let json = with_notes(config, |notes| Ok(notes.export_json()?))?;
    match file {
        Some(path) => {
            std::fs::write(path, json.as_bytes())?;
            println!("Exported {} bytes to {}", json.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_import(config: &DiaryConfig, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(file)?;
    let imported = with_notes(config, |notes| Ok(notes.import_json(&json)?))?;
    println!("Imported {imported} note(s)");
    Ok(())
}

fn cmd_font(
    config: &DiaryConfig,
    family: Option<&str>,
    size: Option<f32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = FilePreferenceStore::new(&config.prefs_dir, FONT_STORE_NAME)?;
    let mut fonts = FontService::load(FontRepository::new(store))?;

    if family.is_some() || size.is_some() {
        let current = fonts.current();
        let family = match family {
            Some(label) => FontFamily::from_label(label)
                .ok_or_else(|| format!("unknown font family `{label}`"))?,
            None => current.family,
        };
        let requested = size.unwrap_or(current.size);
        let saved = fonts.update(family, requested)?;
        if saved.size != requested {
            warn!("event=font_update module=cli status=ok clamped=true");
        }
    }

    let current = fonts.current();
    println!("family={} size={}", current.family.label(), current.size);
    Ok(())
}

fn cmd_backup(
    config: &DiaryConfig,
    action: BackupAction,
    token: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open_db(&config.db_path)?;
    let notes = NoteService::new(SqliteNoteRepository::try_new(&mut conn)?);
    let store = FilePreferenceStore::new(&config.prefs_dir, LOGIN_STORE_NAME)?;
    let login = LoginRepository::new(store);
    let drive = DriveBackupProvider::new(&config.drive_api_base, &config.app_name)?;
    let mut session = BackupService::new(notes, login, drive);

    match action {
        BackupAction::Login {
            account,
            id_token,
            name,
        } => {
            let credential = SignInCredential {
                credential_type: GOOGLE_ID_TOKEN_CREDENTIAL_TYPE.to_string(),
                account_id: account,
                id_token,
                display_name: Some(name),
                access_token: token,
            };
            match session.sign_in(credential) {
                LoginState::Success { user_id, .. } => println!("Signed in as {user_id}"),
                LoginState::Error(message) => return Err(message.clone().into()),
                _ => return Err("sign-in did not complete".into()),
            }
        }
        BackupAction::Logout => {
            session.sign_out();
            println!("Signed out");
        }
        BackupAction::Upload => {
            authorize(&mut session, token)?;
            report(session.upload_backup())?;
        }
        BackupAction::Restore => {
            authorize(&mut session, token)?;
            report(session.download_backup())?;
        }
        BackupAction::List => {
            authorize(&mut session, token)?;
            let state = session.list_backups();
            report(state)?;
            if state.available_backups.is_empty() {
                println!("No backups found");
            }
            for backup in &state.available_backups {
                println!("{}  {}  {}", backup.id, backup.created_time, backup.name);
            }
        }
        BackupAction::Delete { id } => {
            authorize(&mut session, token)?;
            report(session.delete_backup(&id))?;
        }
    }
    Ok(())
}

/// Restores the saved sign-in and hands the access token to the drive client.
fn authorize(
    session: &mut DriveSession<'_>,
    token: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let LoginState::Error(message) = session.restore_saved_login() {
        return Err(format!("{message}; run `diary backup login` first").into());
    }
    let token = token.ok_or("--token is required for drive calls")?;
    if !session.authorize_drive(&token) {
        return Err("drive authorization failed".into());
    }
    Ok(())
}

fn report(state: &DriveUiState) -> Result<(), Box<dyn std::error::Error>> {
    match state.message.as_deref() {
        Some(message) if state.is_error => Err(message.to_string().into()),
        Some(message) => {
            println!("{message}");
            Ok(())
        }
        None => Ok(()),
    }
}
