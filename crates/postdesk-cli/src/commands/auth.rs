use anyhow::anyhow;

use crate::cli::LoginArgs;
use crate::client::ResourceClient;
use crate::error::{CliError, CliResult};
use crate::session::{Session, SessionStore};

pub(crate) async fn handle_login(
    client: &ResourceClient,
    store: &SessionStore,
    args: LoginArgs,
) -> CliResult<()> {
    let username = args.username.trim();
    if username.is_empty() {
        return Err(CliError::validation("username must not be empty"));
    }
    let password = match args.password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")
            .map_err(|err| CliError::failure(anyhow!("failed to read password: {err}")))?,
    };
    if password.is_empty() {
        return Err(CliError::validation("password must not be empty"));
    }

    let response = client.login(username, &password).await?;
    store.save(&Session {
        token: response.token,
        user: response.user,
    })?;
    println!("Logged in as {username}");
    Ok(())
}

pub(crate) fn handle_logout(store: &SessionStore) -> CliResult<()> {
    if store.clear()? {
        println!("Logged out");
    } else {
        println!("No active session");
    }
    Ok(())
}
