//! Command handlers. Each one is a thin shell over an `ApiClient` call.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::warn;

use vaurms_core::models::{Dataset, NewUser, RateTier, UserRole};
use vaurms_core::{ApiClient, ApiError, Config, Outcome};

use crate::{AdminCommand, AnalyticsCommand, Command, DatasetCommand, RatesCommand, UsersCommand};

pub async fn dispatch(api: &ApiClient, config: &mut Config, command: Command) -> Result<()> {
    match command {
        Command::Login { email } => login(api, config, email).await,
        Command::Logout => {
            api.logout().await;
            println!("Logged out");
            Ok(())
        }
        Command::Whoami => {
            let user = api.me().await?;
            println!("{} <{}> ({})", user.display_name(), user.email, user.role.as_str());
            Ok(())
        }
        Command::Get { path, query } => print_outcome(api.get(&path, query).await?),
        Command::Post { path, data } => print_outcome(api.post(&path, &parse_body(data)?).await?),
        Command::Put { path, data } => print_outcome(api.put(&path, &parse_body(data)?).await?),
        Command::Patch { path, data } => print_outcome(api.patch(&path, &parse_body(data)?).await?),
        Command::Delete { path } => print_outcome(api.delete(&path).await?),
        Command::Datasets { command } => datasets(api, command).await,
        Command::Download { path, name } => {
            api.download(&path, &name).await?;
            println!("Downloaded {}", name);
            Ok(())
        }
        Command::Report { report_type, scope } => {
            let export = api.export_report(&report_type, &scope).await?;
            api.download_report(&export).await?;
            println!("Downloaded {}", export.filename);
            Ok(())
        }
        Command::Analytics { command } => analytics(api, command).await,
        Command::Rates { command } => rates(api, command).await,
        Command::Forecast { data } => {
            let forecast = api.run_forecast(&parse_body(data)?).await?;
            println!("Forecast {}", forecast.forecast_id);
            println!("{:>6}  {:>12}  {:>12}  {:>12}  {:>12}", "year", "revenue", "opex", "capex", "ending fund");
            for year in &forecast.results {
                println!(
                    "{:>6}  {:>12.0}  {:>12.0}  {:>12.0}  {:>12.0}",
                    year.year, year.revenue, year.opex, year.capex, year.ending_fund
                );
            }
            Ok(())
        }
        Command::Admin { command } => admin(api, command).await,
        Command::Users { command } => users(api, command).await,
    }
}

async fn login(api: &ApiClient, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let login = match api.login(&email, &password).await {
        Ok(login) => login,
        Err(ApiError::AuthenticationRequired) => anyhow::bail!("Invalid email or password"),
        Err(e) => return Err(e.into()),
    };

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to remember email address");
    }

    println!(
        "Logged in as {} ({})",
        login.user.display_name(),
        login.user.role.as_str()
    );
    Ok(())
}

async fn datasets(api: &ApiClient, command: DatasetCommand) -> Result<()> {
    match command {
        DatasetCommand::List => {
            let datasets = api.list_datasets().await?;
            if datasets.is_empty() {
                println!("No datasets");
            }
            for dataset in &datasets {
                println!("{}", format_dataset_row(dataset));
            }
        }
        DatasetCommand::Upload { file, description } => {
            let uploaded = api.upload_dataset(&file, description.as_deref()).await?;
            println!(
                "Uploaded {} as dataset {} ({})",
                uploaded.name,
                uploaded.id,
                uploaded.status.as_str()
            );
        }
        DatasetCommand::Profile { id } => {
            let profile = api.dataset_profile(id).await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        DatasetCommand::Commit { id } => {
            let result = api.commit_dataset(id).await?;
            println!("{}", result.message);
        }
    }
    Ok(())
}

async fn analytics(api: &ApiClient, command: AnalyticsCommand) -> Result<()> {
    let series = match command {
        AnalyticsCommand::Kpis => {
            let kpis = api.kpis().await?;
            println!("Total revenue    {:>14.2}  ({:+.1}%)", kpis.total_revenue, kpis.revenue_change);
            println!("Collection rate  {:>13.1}%  ({:+.1}%)", kpis.collection_rate, kpis.collection_change);
            println!("Customers        {:>14}  ({:+.1}%)", kpis.customer_count, kpis.customer_change);
            println!("Coverage ratio   {:>14.2}  ({:+.1}%)", kpis.coverage_ratio, kpis.coverage_change);
            return Ok(());
        }
        AnalyticsCommand::Trends { metric } => api.trends(&metric).await?,
        AnalyticsCommand::Cohorts { customer_class } => api.cohorts(&customer_class).await?,
    };
    for (label, value) in series.points() {
        println!("{:<16}  {}", label, value);
    }
    Ok(())
}

async fn rates(api: &ApiClient, command: RatesCommand) -> Result<()> {
    match command {
        RatesCommand::Model { data } => {
            let model = api.model_rates(&parse_body(data)?).await?;
            for (class, impact) in &model.bill_impacts {
                println!(
                    "{:<12}  avg {:+.1}%  max {:+.1}%",
                    class, impact.avg_increase, impact.max_increase
                );
            }
        }
        RatesCommand::Optimise { data } => {
            let result = api.optimise_rates(&parse_body(data)?).await?;
            println!("Fixed charge  {:.2}", result.structure.fixed_charge);
            for tier in &result.structure.tiers {
                println!("{}", format_tier(tier));
            }
            println!(
                "Coverage {:.2}, reserve {:.0}, constraints {}",
                result.coverage_ratio,
                result.reserve_balance,
                if result.constraints_satisfied { "met" } else { "not met" }
            );
        }
    }
    Ok(())
}

async fn admin(api: &ApiClient, command: AdminCommand) -> Result<()> {
    match command {
        AdminCommand::Audit => {
            for entry in api.audit_log().await? {
                let when = entry
                    .timestamp
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "{:<16}  {:<14}  {:<24}  {}",
                    when,
                    entry.action,
                    entry.user_email,
                    entry.description.unwrap_or_default()
                );
            }
        }
        AdminCommand::Jobs => {
            for job in api.jobs().await? {
                println!("{:>4}  {:<18}  {}", job.id, job.job_type, job.status);
            }
        }
    }
    Ok(())
}

async fn users(api: &ApiClient, command: UsersCommand) -> Result<()> {
    match command {
        UsersCommand::List => {
            for user in api.list_users().await? {
                let inactive = if user.is_active == Some(false) { "  (inactive)" } else { "" };
                println!(
                    "{:>4}  {:<8}  {} <{}>{}",
                    user.id,
                    user.role.as_str(),
                    user.display_name(),
                    user.email,
                    inactive
                );
            }
        }
        UsersCommand::Create {
            email,
            role,
            first_name,
            last_name,
        } => {
            let password = rpassword::prompt_password("Password for new user: ")
                .context("Failed to read password")?;
            let user = api
                .create_user(&NewUser {
                    email,
                    password,
                    role,
                    first_name,
                    last_name,
                })
                .await?;
            println!("Created user {} ({})", user.email, user.role.as_str());
        }
    }
    Ok(())
}

fn format_tier(tier: &RateTier) -> String {
    match tier.up_to {
        Some(limit) => format!("  up to {:>10.0}  {:.4}", limit, tier.price),
        None => format!("  {:>16}  {:.4}", "above", tier.price),
    }
}

fn format_dataset_row(dataset: &Dataset) -> String {
    format!(
        "{:>5}  {:<10}  {:>9}  {}",
        dataset.id,
        dataset.status.as_str(),
        dataset.display_size(),
        dataset.name
    )
}

fn print_outcome(outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Outcome::Text(text) => println!("{}", text),
    }
    Ok(())
}

fn parse_body(data: Option<String>) -> Result<Value> {
    match data {
        Some(raw) => serde_json::from_str(&raw).context("--data is not valid JSON"),
        None => Ok(Value::Object(Default::default())),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("No value entered");
    }
    Ok(value)
}

/// Parse a `--role` argument.
pub fn parse_role(arg: &str) -> Result<UserRole, String> {
    match arg.to_ascii_lowercase().as_str() {
        "admin" => Ok(UserRole::Admin),
        "analyst" => Ok(UserRole::Analyst),
        "viewer" => Ok(UserRole::Viewer),
        _ => Err(format!("unknown role `{}` (expected admin, analyst or viewer)", arg)),
    }
}

/// Parse a `key=value` command-line argument.
pub fn parse_key_val(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got `{}`", arg))
}
