use anyhow::Result;
use aprs_beacon::validation::derive_passcode;

pub fn handle_passcode(callsign: &str) -> Result<()> {
    let callsign = callsign.trim();
    if callsign.is_empty() {
        anyhow::bail!("Callsign must not be empty");
    }

    println!("{}", derive_passcode(callsign));
    Ok(())
}
