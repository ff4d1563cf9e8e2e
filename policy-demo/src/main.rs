#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

//! Interactive demo for the device policy core.
//!
//! Runs a small REPL against a simulated device: store account policies,
//! toggle device admin, change the password, and watch the aggregate policy
//! get checked and applied. Type `help` for the command list.

mod device;

use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use device_policy_core::{
    AccountId, AdminEvent, AdminLifecycle, PasswordMode, PasswordQuality, PolicyRecord,
    SecurityPolicy, SecurityPolicyConfig, Verdict,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::device::{AccountTable, SimulatedDevice};

type Policy = SecurityPolicy<SimulatedDevice, AccountTable>;

const HELP: &str = "\
commands:
  set <account> <len> <none|simple|strong> <max-fails> <lock-secs> <wipe:0|1>
  raw <account> <flags>          store raw flags (decimal or 0x..)
  remove <account>               delete an account
  show                           aggregate policy and device state
  check [account]                check the aggregate, or one account's policy
  apply                          push the aggregate policy to the device
  enable | disable               grant or revoke device admin
  password <len> <quality>       user sets a password (unspecified|numeric|alphanumeric|...)
  timeout <millis>               user changes the screen lock timeout
  wipe <account>                 remote wipe requested by an account's server
  clear <account>                dismiss the security notification
  exit | quit";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SecurityPolicyConfig::from_env().context("loading policy configuration")?;
    let policy = SecurityPolicy::new(SimulatedDevice::default(), AccountTable::default(), &config);
    let mut lifecycle = AdminLifecycle::new();
    info!(debug_always_active = config.debug_always_active, "policy demo started");

    println!("device policy demo, type 'help' for commands");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        stdout.flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.first().copied() {
            None => continue,
            Some("exit" | "quit") => break,
            Some("help") => println!("{HELP}"),
            Some(_) => {
                if let Err(err) = run_command(&words, &policy, &mut lifecycle) {
                    eprintln!("error: {err:#}");
                }
            }
        }
    }

    Ok(())
}

fn run_command(words: &[&str], policy: &Policy, lifecycle: &mut AdminLifecycle) -> Result<()> {
    match words {
        ["set", account, len, mode, fails, lock, wipe] => {
            let record = PolicyRecord::new(
                parse(len)?,
                parse_mode(mode)?,
                parse(fails)?,
                parse(lock)?,
                parse::<u8>(wipe)? != 0,
            )?;
            store_policy(policy, parse(account)?, &record);
        }
        ["raw", account, flags] => {
            let flags = parse_flags(flags)?;
            let record = PolicyRecord::decode(flags)?;
            store_policy(policy, parse(account)?, &record);
        }
        ["remove", account] => {
            let account = parse(account)?;
            if !policy.store().remove(account) {
                bail!("no account {account}");
            }
            policy.invalidate(account);
        }
        ["show"] => {
            println!("aggregate: {}", policy.aggregate_policy()?);
            println!("device:    {:?}", policy.authority().snapshot());
            println!("admin:     {}", lifecycle.state());
        }
        ["check"] => report(policy, None, policy.evaluate(None)?),
        ["check", account] => {
            let account = parse(account)?;
            let record = PolicyRecord::decode(policy.store().flags(account))?;
            report(policy, Some(account), policy.evaluate(Some(&record))?);
        }
        ["apply"] => policy.apply_active_policies()?,
        ["enable"] => {
            policy.authority().set_admin(true);
            lifecycle.handle(AdminEvent::Enabled, policy)?;
        }
        ["disable"] => {
            lifecycle.handle(AdminEvent::Disabled, policy)?;
            policy.authority().set_admin(false);
        }
        ["password", len, quality] => {
            policy
                .authority()
                .set_password(parse(len)?, parse_quality(quality)?);
            lifecycle.handle(AdminEvent::PasswordChanged, policy)?;
        }
        ["timeout", millis] => policy.authority().set_lock_timeout(parse(millis)?),
        ["wipe", account] => {
            policy.remote_wipe(parse(account)?)?;
            println!("device wiped");
        }
        ["clear", account] => policy.clear_notification(parse(account)?),
        _ => bail!("unknown command, type 'help'"),
    }
    Ok(())
}

fn store_policy(policy: &Policy, account: AccountId, record: &PolicyRecord) {
    if !policy.is_supported(record) {
        println!("warning: device cannot honour {record}");
    }
    let mut flags = policy.store().flags(account);
    if record.write_flags(&mut flags) {
        policy.store().write(account, flags);
        policy.invalidate(account);
        println!("account {account}: {record} (flags {flags:#x})");
    } else {
        println!("account {account}: unchanged");
    }
}

fn report(policy: &Policy, account: Option<AccountId>, verdict: Verdict) {
    println!("{}: {verdict}", if verdict.is_satisfied() { "ok" } else { "blocked" });
    if let Some(account) = account.filter(|_| !verdict.is_satisfied()) {
        if policy.policies_required(account) {
            println!("notification: security update needed for account {account}");
        }
    }
}

fn parse<T>(word: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    word.parse()
        .with_context(|| format!("invalid number: {word}"))
}

fn parse_flags(word: &str) -> Result<u32> {
    match word.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex: {word}")),
        None => parse(word),
    }
}

fn parse_mode(word: &str) -> Result<PasswordMode> {
    match word {
        "none" => Ok(PasswordMode::None),
        "simple" => Ok(PasswordMode::Simple),
        "strong" => Ok(PasswordMode::Strong),
        other => Err(anyhow!("unknown password mode: {other}")),
    }
}

fn parse_quality(word: &str) -> Result<PasswordQuality> {
    match word {
        "unspecified" => Ok(PasswordQuality::Unspecified),
        "something" => Ok(PasswordQuality::Something),
        "numeric" => Ok(PasswordQuality::Numeric),
        "alphabetic" => Ok(PasswordQuality::Alphabetic),
        "alphanumeric" => Ok(PasswordQuality::Alphanumeric),
        other => Err(anyhow!("unknown password quality: {other}")),
    }
}
