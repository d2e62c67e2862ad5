use std::{path::PathBuf, process::exit, str::FromStr, time::Duration};

use clap::Parser;
use email_address::EmailAddress;

use budgetbook::{
    PasswordHash, ValidatedPassword, count_users, create_user, initialize_db, open_connection,
};

/// Create the budgetbook database and, optionally, its first admin user.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the SQLite database, created if it does not exist.
    #[arg(long, env = "DB_PATH", default_value = "budgetbook.db")]
    db_path: PathBuf,

    /// The name of the admin user to create.
    #[arg(long, requires_all = ["admin_email", "admin_password"])]
    admin_name: Option<String>,

    /// The email address the admin user logs in with.
    #[arg(long, requires = "admin_name")]
    admin_email: Option<String>,

    /// The admin user's password.
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true, requires = "admin_name")]
    admin_password: Option<String>,
}

fn main() {
    let args = Args::parse();

    println!("Initializing database at {:#?}", args.db_path);

    let connection = match open_connection(&args.db_path, Duration::from_secs(10)) {
        Ok(connection) => connection,
        Err(error) => {
            eprintln!("Could not open the database: {error}");
            exit(1);
        }
    };

    if let Err(error) = initialize_db(&connection) {
        eprintln!("Could not create the tables: {error}");
        exit(1);
    }

    let (Some(name), Some(raw_email), Some(raw_password)) =
        (args.admin_name, args.admin_email, args.admin_password)
    else {
        println!("Done, no admin user requested.");
        return;
    };

    match count_users(&connection) {
        Ok(0) => {}
        Ok(count) => {
            eprintln!("The database already has {count} user(s), refusing to create an admin.");
            exit(1);
        }
        Err(error) => {
            eprintln!("Could not count the users: {error}");
            exit(1);
        }
    }

    let email = match EmailAddress::from_str(&raw_email) {
        Ok(email) => email,
        Err(error) => {
            eprintln!("\"{raw_email}\" is not a valid email address: {error}");
            exit(1);
        }
    };

    let password = match ValidatedPassword::new(&raw_password, &[&name, email.as_str()]) {
        Ok(password) => password,
        Err(error) => {
            eprintln!("{error}");
            exit(1);
        }
    };

    let result = PasswordHash::new(password, PasswordHash::DEFAULT_COST)
        .and_then(|password_hash| create_user(&name, &email, password_hash, &connection));

    match result {
        Ok(user) => println!("Created admin user {} <{}>.", user.name, user.email),
        Err(error) => {
            eprintln!("Could not create the admin user: {error}");
            exit(1);
        }
    }
}
