//! 按指定字符编码读写文本文件（encoding_rs 标签）
use anyhow::{Context, Result};
use encoding_rs::Encoding;
use std::path::Path;

/// 解析编码标签（如 "utf-8"、"shift_jis"、"windows-1252"）
pub fn encoding_for(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).with_context(|| format!("unknown charset `{label}`"))
}

/// 读取文本：存在 BOM 时以 BOM 为准，否则按 `label` 解码；非法字节以替换字符代替
pub fn read_text(path: &Path, label: &str) -> Result<String> {
    let encoding = encoding_for(label)?;
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let (text, _, _) = encoding.decode(&bytes);
    Ok(text.into_owned())
}

/// 写出文本，必要时创建父目录
///
/// UTF-16 标签按 encoding_rs 的约定以 UTF-8 写出。
pub fn write_text(path: &Path, text: &str, label: &str) -> Result<()> {
    let encoding = encoding_for(label)?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
    }
    let (bytes, _, _) = encoding.encode(text);
    std::fs::write(path, &bytes).with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_jis_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/a.java");
        write_text(&path, "// コメント\n", "shift_jis").unwrap();
        let raw = std::fs::read(&path).unwrap();
        assert_ne!(raw, "// コメント\n".as_bytes());
        assert_eq!(read_text(&path, "Shift_JIS").unwrap(), "// コメント\n");
    }

    #[test]
    fn bom_overrides_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.txt");
        std::fs::write(&path, b"\xEF\xBB\xBFabc").unwrap();
        assert_eq!(read_text(&path, "windows-1252").unwrap(), "abc");
    }

    #[test]
    fn unknown_label_is_an_error() {
        assert!(encoding_for("no-such-charset").is_err());
    }
}
