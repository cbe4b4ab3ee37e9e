use {
    anyhow::Result,
    livewire_api::{ApiGateway, auth, types::RegisterRequest},
};

pub async fn login(gateway: &ApiGateway, email: &str, password: &str) -> Result<()> {
    let user = auth::login(gateway, email, password).await?;
    println!(
        "Logged in as {} ({})",
        user.display_name.as_deref().unwrap_or("unnamed"),
        user.email
    );
    Ok(())
}

pub async fn register(
    gateway: &ApiGateway,
    email: String,
    password: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
) -> Result<()> {
    let payload = RegisterRequest {
        email,
        // The server double-checks; the CLI has no second prompt to compare.
        password_confirm: password.clone(),
        password,
        display_name,
        avatar_url,
    };
    let user = auth::register(gateway, &payload).await?;
    println!("Account created for {}. Run `livewire login` to sign in.", user.email);
    Ok(())
}

pub fn logout(gateway: &ApiGateway) -> Result<()> {
    auth::logout(gateway)?;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(gateway: &ApiGateway) -> Result<()> {
    let user = auth::current_user(gateway).await?;
    println!(
        "{} ({})  joined {}  email verified: {}",
        user.display_name.as_deref().unwrap_or("unnamed"),
        user.email,
        user.date_joined,
        user.is_email_verified
    );
    Ok(())
}

pub async fn users(gateway: &ApiGateway, search: Option<&str>) -> Result<()> {
    let users = auth::list_users(gateway, search).await?;
    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }
    for user in users {
        println!(
            "{:>6}  {}  {}",
            user.id,
            user.email,
            user.display_name.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
