use crate::models::error::SError;
use camino::Utf8Path;
use serde::Serialize;

pub struct Json;

impl Json {
    /// Writes `data` pretty-printed with four-space indentation.
    /// The file is replaced as a whole through a sibling temp file.
    pub fn write<T: Serialize>(path: &Utf8Path, data: &T) -> Result<(), SError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        data.serialize(&mut ser)?;
        buf.push(b'\n');

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &buf)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn read<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<T, SError> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str::<T>(&s)?)
    }
}
