use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;

use sev_archive::{Error, extract_file, extract_zip};
use zip::write::SimpleFileOptions;

const FLAG_UTF8: u16 = 0x0800;

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

/// Assemble a stored (uncompressed) zip by hand so entry names can carry
/// arbitrary bytes and flags, the way legacy writers produce them.
fn raw_zip(entries: &[(&[u8], &[u8])], flags: u16) -> Vec<u8> {
    const DOS_DATE: u16 = (44 << 9) | (1 << 5) | 1;

    let mut out = Vec::new();
    let mut central = Vec::new();

    for (name, content) in entries {
        let offset = out.len() as u32;
        let crc = crc32(content);
        let size = content.len() as u32;

        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&DOS_DATE.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(content);

        central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&flags.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&DOS_DATE.to_le_bytes());
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u32.to_le_bytes());
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name);
    }

    let central_offset = out.len() as u32;
    out.extend_from_slice(&central);
    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&(central.len() as u32).to_le_bytes());
    out.extend_from_slice(&central_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}

#[test]
fn unflagged_utf8_name_decodes_to_intended_text() {
    let name = "café/résumé.json";
    let data = raw_zip(&[(name.as_bytes(), b"[]")], 0);
    let dir = tempfile::tempdir().unwrap();

    let report = extract_zip(Cursor::new(data), dir.path()).unwrap();

    assert_eq!(report.entries[0].name, name);
    assert!(dir.path().join("café").join("résumé.json").exists());
    // what a CP437 reading of the same bytes would have produced
    assert!(!dir.path().join("caf├⌐").exists());
}

#[test]
fn flagged_utf8_name_is_untouched() {
    let name = "日本語.json";
    let data = raw_zip(&[(name.as_bytes(), b"{}")], FLAG_UTF8);
    let dir = tempfile::tempdir().unwrap();

    extract_zip(Cursor::new(data), dir.path()).unwrap();

    assert_eq!(std::fs::read(dir.path().join(name)).unwrap(), b"{}");
}

#[test]
fn undecodable_name_fails_whole_archive() {
    let data = raw_zip(&[(b"ok.json", b"[]"), (b"gr\x81n.json", b"[]")], 0);
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("export.zip");
    std::fs::write(&archive, data).unwrap();

    let result = extract_file(&archive, &dir.path().join("out"));

    assert!(matches!(result, Err(Error::FilenameEncoding { .. })));
}

#[test]
fn zip_slip_entry_rejected() {
    let data = raw_zip(&[(b"../escape.json", b"[]")], 0);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out");

    let result = extract_zip(Cursor::new(data), &dest);

    assert!(matches!(result, Err(Error::ZipSlip { .. })));
    assert!(!dir.path().join("escape.json").exists());
}

#[test]
fn non_zip_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.tar.gz");
    File::create(&path)
        .unwrap()
        .write_all(&[0x1F, 0x8B, 0x08, 0x00, 0, 0, 0, 0])
        .unwrap();

    let result = extract_file(&path, &dir.path().join("out"));

    match result {
        Err(Error::UnsupportedFormat { detected, .. }) => {
            assert_eq!(detected, Some(sev_archive::ArchiveFormat::Gzip))
        }
        other => panic!("expected UnsupportedFormat, got {other:?}"),
    }
}

#[test]
fn extract_file_from_writer_built_archive() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("Team Slack export.zip");
    {
        let mut writer = zip::ZipWriter::new(File::create(&archive).unwrap());
        writer
            .start_file("general/2024-01-01.json", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"[{\"text\":\"hi\"}]").unwrap();
        writer.finish().unwrap();
    }

    let out = dir.path().join("out");
    let report = extract_file(&archive, &out).unwrap();

    assert_eq!(report.files().count(), 1);
    assert!(Path::new(&out).join("general/2024-01-01.json").exists());
}
