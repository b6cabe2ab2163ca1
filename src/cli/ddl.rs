use std::io::Write;

use crate::cli::wprintln;
use crate::innodb::schema;
use crate::IbdError;

pub struct DdlOptions {
    pub file: String,
}

pub fn execute(opts: &DdlOptions, writer: &mut dyn Write) -> Result<(), IbdError> {
    let mut ts = crate::cli::open_tablespace(&opts.file)?;
    let records = ts.dump_sdi()?;

    let mut found = false;
    for record in &records {
        if let Some(table) = schema::table_ddl(record)? {
            if found {
                wprintln!(writer)?;
            }
            found = true;
            wprintln!(writer, "-- {}.{}", table.schema, table.table)?;
            wprintln!(writer, "{};", table.ddl)?;
        }
    }
    if !found {
        wprintln!(writer, "-- no table objects in the SDI")?;
    }
    Ok(())
}
