use std::{
    error::Error,
    io::{self},
    path::Path,
    process::exit,
    sync::{Arc, Mutex},
};

use clap::Parser;
use rusqlite::Connection;

use purse_api::{CredentialStore, PasswordHash, User, ValidatedPassword, initialize_db, parse_email};

/// A utility for changing the password for a registered user.
///
/// All of the user's sessions are logged out afterwards.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DATABASE_PATH")]
    db_path: String,

    /// The email address of the user whose password should be reset.
    #[arg(long)]
    email: String,

    /// The bcrypt cost used when hashing the new password.
    #[arg(long, env = "PASSWORD_COST", default_value_t = PasswordHash::DEFAULT_COST,
          value_parser = clap::value_parser!(u32).range(4..=31))]
    password_cost: u32,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    println!("Loading user from {db_path:#?}");
    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;
    let store = CredentialStore::new(Arc::new(Mutex::new(connection)), args.password_cost)?;

    let email = parse_email(&args.email)?;
    let Some(mut user) = store.find_by_email(&email)? else {
        print_error(format!("No user is registered with the email {email}"));
        exit(1);
    };
    println!("Resetting password for {}", user.email);

    let Some(password) = get_new_password() else {
        return Ok(());
    };
    update_password(&store, &mut user, password)?;

    Ok(())
}

fn validate_db_path(db_path: &Path) {
    match db_path.extension() {
        None => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if !db_path.is_file() {
        eprintln!("File does not exist at {db_path:#?}!");
        exit(1);
    }
}

fn prompt(message: &str) -> Option<String> {
    match rpassword::prompt_password(message) {
        Ok(string) => Some(string),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

fn get_new_password() -> Option<ValidatedPassword> {
    loop {
        println!();

        let first_password = prompt("Enter a new password: ")?;

        let password = match ValidatedPassword::new(&first_password) {
            Ok(password) => password,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let second_password = prompt("Enter the same password again: ")?;

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        return Some(password);
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

/// From https://crates.io/crates/capitalize
fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}

fn update_password(
    store: &CredentialStore,
    user: &mut User,
    password: ValidatedPassword,
) -> Result<(), purse_api::Error> {
    user.set_password(password);
    store.save(user)?;
    println!("Password updated successfully!");

    let session_count = user.tokens.len();
    store.clear_tokens(user)?;
    println!("Logged out of {session_count} session(s).");

    Ok(())
}
