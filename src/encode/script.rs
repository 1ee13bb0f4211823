use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{LevelsError, Result};

/// Wrap a rendered table in the Lua module that hands it to the game.
///
/// The module collects the table into `tbl`, appends the shortest band
/// length as `minSamples`, and exposes both through `returnAudioFile()`.
pub fn render_script(table_text: &str, table_name: &str) -> String {
    format!(
        r#"
{table_text}

local module = {{}}

local tbl = {{}}

table.insert(tbl, {table_name})

local minSamples = math.huge
for k, v in next, tbl do
    for k1, v1 in next, v do
        if #v1 < minSamples then
            minSamples = #v1
        end
    end
end
table.insert(tbl, minSamples)

function module.returnAudioFile()
    return tbl
end

return module
"#
    )
}

/// Replace `path` with `script`.
pub fn write_script(path: &Path, script: &str) -> Result<()> {
    write_replacing(path, |w| w.write_all(script.as_bytes()))?;
    log::info!("Wrote {} bytes to {}", script.len(), path.display());
    Ok(())
}

/// Fill a temporary file next to `path`, then rename it over `path`.
/// On any failure the destination keeps its previous contents and the
/// temporary file is removed when it drops.
fn write_replacing<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let write_err = |source: std::io::Error| LevelsError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        fill(&mut writer).map_err(write_err)?;
        writer.flush().map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_embeds_table_and_accessor() {
        let script = render_script("tblSong = {\n}", "tblSong");
        assert!(script.starts_with("\ntblSong = {\n}\n\nlocal module = {}\n"));
        assert!(script.contains("table.insert(tbl, tblSong)\n"));
        assert!(script.contains("local minSamples = math.huge\n"));
        assert!(script.contains("function module.returnAudioFile()\n    return tbl\nend\n"));
        assert!(script.ends_with("\nreturn module\n"));
    }

    #[test]
    fn write_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song_data.lua");
        std::fs::write(&path, "old contents that are much longer than the new ones").unwrap();

        write_script(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song_data.lua");
        std::fs::write(&path, "old good contents\n").unwrap();

        let err = write_replacing(&path, |w| {
            w.write_all(&[b'x'; 64 * 1024])?;
            Err(std::io::Error::other("disk full"))
        })
        .unwrap_err();

        assert!(matches!(err, LevelsError::Write { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old good contents\n");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn missing_directory_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("song_data.lua");
        let err = write_script(&path, "x").unwrap_err();
        assert!(matches!(err, LevelsError::Write { .. }));
        assert!(!path.exists());
    }
}
