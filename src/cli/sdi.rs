use std::io::Write;

use crate::cli::wprintln;
use crate::innodb::sdi;
use crate::IbdError;

pub struct SdiOptions {
    pub file: String,
    pub pretty: bool,
}

pub fn execute(opts: &SdiOptions, writer: &mut dyn Write) -> Result<(), IbdError> {
    let mut ts = crate::cli::open_tablespace(&opts.file)?;
    let records = ts.dump_sdi()?;

    let envelope = sdi::json_envelope(&records);
    if opts.pretty {
        let value: serde_json::Value =
            serde_json::from_slice(&envelope).map_err(|e| IbdError::JsonUnreadable {
                id: 0,
                reason: e.to_string(),
            })?;
        let pretty = serde_json::to_string_pretty(&value)
            .map_err(|e| IbdError::Io(e.to_string()))?;
        wprintln!(writer, "{}", pretty)?;
    } else {
        writer
            .write_all(&envelope)
            .and_then(|_| writeln!(writer))
            .map_err(|e| IbdError::Io(e.to_string()))?;
    }
    Ok(())
}
