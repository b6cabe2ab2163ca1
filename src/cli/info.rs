use colored::Colorize;
use std::io::Write;

use crate::cli::wprintln;
use crate::IbdError;

pub struct InfoOptions {
    pub file: String,
}

pub fn execute(opts: &InfoOptions, writer: &mut dyn Write) -> Result<(), IbdError> {
    let ts = crate::cli::open_tablespace(&opts.file)?;
    let ps = ts.page_size();

    wprintln!(writer, "{}", format!("Tablespace: {}", opts.file).bold())?;
    wprintln!(writer, "  Space id:       {}", ts.space_id())?;
    wprintln!(writer, "  Flags:          {:#010x}", ts.flags())?;
    wprintln!(
        writer,
        "  Logical size:   {} bytes (shift {})",
        ps.logical,
        ps.logical_shift
    )?;
    wprintln!(
        writer,
        "  Physical size:  {} bytes (shift {})",
        ps.physical,
        ps.physical_shift
    )?;
    wprintln!(
        writer,
        "  Compressed:     {}",
        if ps.is_compressed {
            format!("yes (ssize {})", ps.ssize).yellow().to_string()
        } else {
            "no".to_string()
        }
    )?;
    wprintln!(
        writer,
        "  SDI flag:       {}",
        if ts.has_sdi_flag() { "set" } else { "not set" }
    )?;
    wprintln!(writer, "  SDI version:    {}", ts.sdi_version())?;
    wprintln!(writer, "  SDI root page:  {}", ts.sdi_root_page_num())?;
    Ok(())
}
