use clap::Subcommand;
use oasis_core::{AuthProvider, Config};

use super::{open_auth, CmdResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Email a sign-in link
    Login {
        email: String,
    },
    /// Finish signing in with the URL the link redirected to
    Callback {
        url: String,
    },
    /// Show who is signed in
    Status,
    /// Forget the saved session
    Logout,
}

pub async fn run(action: AuthAction, config: &Config) -> CmdResult {
    let auth = open_auth(config)?;

    match action {
        AuthAction::Login { email } => {
            auth.sign_in_with_link(&email).await?;
            println!("Check your email for the login link!");
        }
        AuthAction::Callback { url } => {
            let identity = auth.complete_callback(&url).await?;
            println!(
                "signed in as {}",
                identity.email.as_deref().unwrap_or(&identity.user_id)
            );
        }
        AuthAction::Status => match auth.current_session() {
            Some(identity) => {
                let status = serde_json::json!({
                    "signed_in": true,
                    "user_id": identity.user_id,
                    "email": identity.email,
                    "expires_at": identity.expires_at,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
            None => println!("{}", serde_json::json!({ "signed_in": false })),
        },
        AuthAction::Logout => {
            auth.sign_out()?;
            println!("signed out");
        }
    }
    Ok(())
}
