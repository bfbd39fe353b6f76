//! Terminal rendering of flow state.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::Write;

use chrono::{DateTime, Utc};
use n1nj4_core::{AppStep, BindingRecord, NftData};
use n1nj4_gate::chain::CollectionInfo;
use n1nj4_gate::slogans;
use n1nj4_gate::{FlowState, GateConfig};
use url::Url;

/// Passkey ids longer than this are shortened on the passport.
const PASSKEY_ID_DISPLAY_LEN: usize = 32;

pub fn banner() {
    println!("{}", slogans::TITLE);
    println!("{}", slogans::SUBTITLE);
    println!();
}

pub fn line(text: &str) {
    println!("{text}");
}

pub fn prompt(text: &str) -> std::io::Result<()> {
    print!("{text}");
    std::io::stdout().flush()
}

/// Print a loading text as the flow publishes it.
pub fn progress(state: &FlowState) {
    if let (true, Some(text)) = (state.loading, state.loading_text) {
        println!("... {text}");
    }
}

pub fn fatal(text: &str) {
    eprintln!("{text}");
}

pub fn state(state: &FlowState, config: &GateConfig) {
    if let Some(error) = &state.error {
        println!("! {error}");
    }

    match state.step {
        AppStep::Connect => {
            println!("[{}]", slogans::CONNECT_WALLET);
            println!("{}", slogans::DESCRIPTION);
        }
        AppStep::Nft => {
            if let Some(nft) = &state.nft {
                nft_card(nft);
            }
            println!("{}", slogans::AUTHORIZE_HINT);
        }
        AppStep::Verified => {
            if let Some(record) = &state.record {
                passport(record, config);
            }
            println!("{}", slogans::FOOTER_TEXT);
        }
    }
}

pub fn handoff_instructions(origin: &Url) {
    println!();
    println!("Open {origin} and run navigator.credentials.create with the options below,");
    println!("then paste credential.toJSON() as one line (empty line cancels):");
}

pub fn nft(nft: &NftData) {
    nft_card(nft);
}

pub fn record(record: &BindingRecord, config: &GateConfig) {
    passport(record, config);
}

pub fn collection(info: &CollectionInfo, config: &GateConfig) {
    println!("Contract: {}", config.nft.contract_address);
    println!("Name:     {}", info.name);
    println!("Symbol:   {}", info.symbol);
    println!("Network:  {} ({})", config.chain.name, config.chain.id);
    if let Some(explorer) = &config.chain.explorer_url {
        println!("Explorer: {explorer}");
    }
}

fn nft_card(nft: &NftData) {
    println!("+--------------------------------+");
    println!("| {:<30} |", nft.name);
    println!("| {:<30} |", format!("ID: #{}", nft.token_id));
    println!("+--------------------------------+");
}

fn passport(record: &BindingRecord, config: &GateConfig) {
    println!("== {} ==", slogans::PASSPORT_TITLE);
    println!("Wallet Address  {}", record.address);
    println!("Passkey ID      {}", truncate(&record.passkey_id));
    println!(
        "Date            {}",
        record.created_at().map_or_else(|| "-".to_string(), format_date)
    );
    println!("Status          Permanent");
    println!("Network         {}", config.chain.name);
}

fn truncate(value: &str) -> String {
    if value.chars().count() > PASSKEY_ID_DISPLAY_LEN {
        let head: String = value.chars().take(PASSKEY_ID_DISPLAY_LEN).collect();
        format!("{head}...")
    } else {
        value.to_string()
    }
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
