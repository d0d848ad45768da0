//! CLI session commands: `login`, `signup`, `logout`, `guest`, `whoami`.

use anyhow::{bail, Result};
use dialoguer::{Input, Password};

use moodlog::config::MoodlogConfig;
use moodlog::session::{self, LoginForm, SignupForm};

use super::{connect, spinner};

const LOGIN_FAILED: &str = "Login failed. Please try again.";
const SIGNUP_FAILED: &str = "Signup failed. Please try again.";

pub async fn login(config: &MoodlogConfig, username: Option<String>) -> Result<()> {
    let (store, api) = connect(config)?;

    let username = match username {
        Some(username) => username,
        None => Input::new().with_prompt("Username").interact_text()?,
    };
    let password = Password::new().with_prompt("Password").interact()?;

    let credentials = LoginForm { username, password }.validate()?;

    let pb = spinner("Signing in...");
    let result = api.login(&credentials).await;
    pb.finish_and_clear();

    match result {
        Ok(auth) => {
            let session = session::establish(store.as_ref(), &auth)?;
            println!("Signed in as {}.", session.username());
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = %e, "login failed");
            bail!("{}", e.detail().unwrap_or(LOGIN_FAILED))
        }
    }
}

pub async fn signup(config: &MoodlogConfig) -> Result<()> {
    let (store, api) = connect(config)?;

    let form = SignupForm {
        username: Input::new().with_prompt("Username").interact_text()?,
        email: Input::new().with_prompt("Email").interact_text()?,
        password: Password::new().with_prompt("Password").interact()?,
        confirm_password: Password::new().with_prompt("Confirm password").interact()?,
    };
    let request = form.validate()?;

    let pb = spinner("Creating account...");
    let result = api.signup(&request).await;
    pb.finish_and_clear();

    match result {
        Ok(auth) => {
            let session = session::establish(store.as_ref(), &auth)?;
            println!("Welcome, {}! You are signed in.", session.username());
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = %e, "signup failed");
            bail!("{}", e.detail().unwrap_or(SIGNUP_FAILED))
        }
    }
}

pub fn logout(config: &MoodlogConfig) -> Result<()> {
    let (store, _) = connect(config)?;
    session::destroy(store.as_ref())?;
    println!("Signed out. Local data cleared.");
    Ok(())
}

pub fn guest(config: &MoodlogConfig) -> Result<()> {
    let (store, _) = connect(config)?;
    session::destroy(store.as_ref())?;
    println!("Continuing as guest. Your data stays on this machine only.");
    Ok(())
}

pub fn whoami(config: &MoodlogConfig) -> Result<()> {
    let (store, _) = connect(config)?;
    match session::current(store.as_ref())? {
        Some(session) => {
            let email = session
                .user
                .as_ref()
                .and_then(|u| u.email.as_deref())
                .map(|e| format!(" <{e}>"))
                .unwrap_or_default();
            println!("Signed in as {}{email}", session.username());
        }
        None => println!("Guest (not signed in)"),
    }
    Ok(())
}
