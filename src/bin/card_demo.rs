//! Interactive driver for the scenarios in spec.md section 8. Builds a
//! `Session` from a `CardConfig` (optionally overridden at the command
//! line, matching the derive-style CLI used elsewhere in the retrieved
//! corpus) and walks it through a fixed command script, printing each
//! command's status word.

use clap::Parser;
use gpg_card_core::{CardConfig, InMemoryDoStore, RetryLimits, RsaSha1Backend, Session};

#[derive(Debug, Parser)]
#[clap(name = "card_demo")]
#[clap(about = "Drives an in-memory OpenPGP card core through a fixed command script.", long_about = None)]
struct Cli {
    /// Retry-counter maximum for PW1 (user password).
    #[clap(long, default_value_t = 3)]
    pw1_retries: u8,
    /// Retry-counter maximum for the reset code.
    #[clap(long, default_value_t = 3)]
    rc_retries: u8,
    /// Retry-counter maximum for PW3 (admin password).
    #[clap(long, default_value_t = 3)]
    pw3_retries: u8,
    /// If set, a successful PSO-CDS authorization survives across
    /// commands instead of being single-shot.
    #[clap(long)]
    pw1_lifetime: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let limits = RetryLimits { user: cli.pw1_retries, reset_code: cli.rc_retries, admin: cli.pw3_retries };
    let config = CardConfig::new(cli.pw1_lifetime, limits);
    let mut session = Session::new(Box::new(InMemoryDoStore::new()), Box::new(RsaSha1Backend), config);

    let digest_info = [0xAAu8; 35];

    let script: Vec<(&str, Vec<u8>)> = vec![
        ("SELECT DF_OPENPGP", vec![0x00, 0xA4, 0x04, 0x00, 0x06, 0xD2, 0x76, 0x00, 0x01, 0x24, 0x01]),
        ("VERIFY PW1 (PSO-CDS)", {
            let mut v = vec![0x00, 0x20, 0x00, 0x81, 0x06];
            v.extend_from_slice(b"123456");
            v
        }),
        ("PSO-CDS sign (expect GENERIC_ERROR, no key installed)", {
            let mut v = vec![0x00, 0x2A, 0x9E, 0x9A, 0x23];
            v.extend_from_slice(&digest_info);
            v
        }),
        ("SELECT EF_SERIAL", vec![0x00, 0xA4, 0x04, 0x00, 0x02, 0x2F, 0x02]),
        ("READ BINARY", vec![0x00, 0xB0, 0x00, 0x00, 0x00]),
    ];

    for (label, request) in script {
        gpg_card_core::dispatcher::dispatch(&mut session, &request);
        let sw = session.res.status_word().expect("every handler exit writes a status word");
        println!("{label}: {:02X} {:02X} ({} byte payload)", sw.0, sw.1, session.res.payload().len());
    }
}
