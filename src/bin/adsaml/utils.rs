use adsaml::aws::credentials_file::CredentialsFile;
use adsaml::aws::{Account, Credential};
use anyhow::Result;
use secrecy::SecretString;
use std::io::{self, BufRead, Write};

pub fn prompt_password() -> Result<SecretString> {
    let password = rpassword::prompt_password("Password: ")?;

    Ok(SecretString::from(password))
}

pub fn input_with_default(display: &str, default: &str) -> Result<String> {
    print!("{display} ({default}): ");
    io::stdout().flush()?;

    let mut buffer = String::new();
    io::stdin().lock().read_line(&mut buffer)?;

    let value = buffer.trim();
    if value.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(value.to_string())
    }
}

/// Renders the account/role menu with a flat index that runs continuously
/// across accounts, then reads one line. Validating the answer is the
/// resolver's job, not this prompt's.
pub fn prompt_role_selection(accounts: &[Account]) -> String {
    println!();
    println!("Please choose the role you would like to assume:");

    let mut index = 0;
    for account in accounts {
        println!("{}", account.name());
        for role in account.roles() {
            println!(" [{index}] {} {}", role.display_name(), role.arn());
            index += 1;
        }
    }

    print!("Selection: ");
    let _ = io::stdout().flush();

    let mut buffer = String::new();
    if io::stdin().lock().read_line(&mut buffer).is_err() {
        return String::new();
    }

    buffer.trim().to_string()
}

pub fn print_success_report(store: &CredentialsFile, profile: &str, credential: &Credential) {
    println!();
    println!("----------------------------------------------------------------");
    println!(
        "Your new access key pair has been stored in {} under the {profile} profile.",
        store.path().display()
    );
    println!("Note that it will expire at {}.", credential.expiration());
    println!("After this time you may safely rerun this command to refresh your access key pair.");
    println!(
        "To use the credential, call the AWS CLI with the --profile option \
         (e.g. aws --profile {profile} ec2 describe-instances)."
    );
    println!("----------------------------------------------------------------");
    println!();
    println!("Assumed role is:");
    println!("{}", credential.assumed_role_arn());
}
