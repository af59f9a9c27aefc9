// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2023-2026, Nubificus LTD

//! Solo5 manifest parser: reads the `.note.solo5.manifest` ELF note out
//! of a unikernel binary and decodes its fixed-layout device table.
//!
//! Layout, little-endian throughout:
//!
//! ```text
//! (optional) Elf64_Nhdr { namesz: u32, descsz: u32, type: u32 }
//!            name: b"Solo5\0" padded to a 4-byte boundary
//! MftHeader  { pad: u32, version: u32, entries: u32 }   // version must be 1
//! MftEntry[] { name: [u8; 65], pad: [u8; 7], kind: u64, flags: u64, pad2: [u8; 16] }  // 104 bytes each
//! ```
//!
//! Some toolchains emit the descriptor without the note header at all;
//! this parser detects the header by checking for the `Solo5\0` name
//! and falls back to treating the whole section as the descriptor.

use elf::endian::AnyEndian;
use elf::ElfBytes;
use std::path::Path;
use thiserror::Error;
use uruncio_core::solo5::{DeviceType, Solo5Entry, Solo5Manifest};

const NOTE_NAME: &[u8] = b"Solo5\0";
const MFT_HEADER_LEN: usize = 12;
const MFT_ENTRY_LEN: usize = 104;
const MFT_ENTRY_NAME_LEN: usize = 65;
const MANIFEST_SECTION: &str = ".note.solo5.manifest";

#[derive(Debug, Error)]
pub enum Solo5ParseError {
    #[error("failed to read unikernel binary {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse ELF file: {0}")]
    Elf(String),
    #[error("unikernel binary has no {MANIFEST_SECTION} section")]
    MissingSection,
    #[error("manifest descriptor header is too short: {0} bytes")]
    Truncated(usize),
    #[error("unsupported manifest version {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("entry name is not valid UTF-8")]
    InvalidName,
    #[error("entry name {0:?} is empty, too long, or contains characters outside [A-Za-z0-9_]")]
    MalformedName(String),
}

pub fn parse_manifest_from_file(path: &Path) -> Result<Solo5Manifest, Solo5ParseError> {
    let bytes = std::fs::read(path).map_err(|source| Solo5ParseError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let elf = ElfBytes::<AnyEndian>::minimal_parse(&bytes)
        .map_err(|e| Solo5ParseError::Elf(e.to_string()))?;
    let section = elf
        .section_header_by_name(MANIFEST_SECTION)
        .map_err(|e| Solo5ParseError::Elf(e.to_string()))?
        .ok_or(Solo5ParseError::MissingSection)?;
    let (data, _compression) = elf
        .section_data(&section)
        .map_err(|e| Solo5ParseError::Elf(e.to_string()))?;
    parse_manifest(data)
}

/// Parses a manifest out of raw section bytes, with or without the ELF
/// note wrapper.
pub fn parse_manifest(data: &[u8]) -> Result<Solo5Manifest, Solo5ParseError> {
    let descriptor = strip_note_header(data);
    if descriptor.len() < MFT_HEADER_LEN {
        return Err(Solo5ParseError::Truncated(descriptor.len()));
    }

    let version = u32::from_le_bytes(descriptor[4..8].try_into().unwrap());
    if version != 1 {
        return Err(Solo5ParseError::UnsupportedVersion(version));
    }
    let entry_count = u32::from_le_bytes(descriptor[8..12].try_into().unwrap()) as usize;

    let entries_bytes = &descriptor[MFT_HEADER_LEN..];
    let available = entries_bytes.len() / MFT_ENTRY_LEN;
    let present = entry_count.min(available);

    let mut entries = Vec::with_capacity(present);
    for chunk in entries_bytes[..present * MFT_ENTRY_LEN].chunks_exact(MFT_ENTRY_LEN) {
        if let Some(entry) = parse_entry(chunk)? {
            entries.push(entry);
        }
    }

    Ok(Solo5Manifest { entries })
}

fn strip_note_header(data: &[u8]) -> &[u8] {
    if data.len() < MFT_HEADER_LEN {
        return data;
    }
    let namesz = u32::from_le_bytes(data[0..4].try_into().unwrap()) as usize;
    if namesz != NOTE_NAME.len() {
        return data;
    }
    let name_start = MFT_HEADER_LEN;
    let name_end = name_start + namesz;
    if data.len() < name_end || &data[name_start..name_end] != NOTE_NAME {
        return data;
    }
    let padded_name_len = (namesz + 3) & !3;
    let descriptor_start = name_start + padded_name_len;
    if descriptor_start >= data.len() {
        return data;
    }
    &data[descriptor_start..]
}

/// Parses one entry, returning `None` for an entry with an empty name
/// (an unused table slot) rather than an error.
fn parse_entry(chunk: &[u8]) -> Result<Option<Solo5Entry>, Solo5ParseError> {
    let raw_name = &chunk[0..MFT_ENTRY_NAME_LEN];
    let nul_at = raw_name.iter().position(|&b| b == 0).unwrap_or(raw_name.len());
    let name = std::str::from_utf8(&raw_name[..nul_at])
        .map_err(|_| Solo5ParseError::InvalidName)?
        .to_string();
    if name.is_empty() {
        return Ok(None);
    }
    validate_entry_name(&name)?;

    let kind_offset = MFT_ENTRY_NAME_LEN + 7;
    let kind = u64::from_le_bytes(chunk[kind_offset..kind_offset + 8].try_into().unwrap());

    Ok(Some(Solo5Entry {
        name,
        device_type: DeviceType::from_raw(kind),
    }))
}

fn validate_entry_name(name: &str) -> Result<(), Solo5ParseError> {
    let valid = name.len() <= 64 && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if valid {
        Ok(())
    } else {
        Err(Solo5ParseError::MalformedName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_entry(name: &str, kind: u64) -> Vec<u8> {
        let mut bytes = vec![0u8; MFT_ENTRY_LEN];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        let kind_offset = MFT_ENTRY_NAME_LEN + 7;
        bytes[kind_offset..kind_offset + 8].copy_from_slice(&kind.to_le_bytes());
        bytes
    }

    fn build_descriptor(entries: &[(&str, u64)]) -> Vec<u8> {
        let mut bytes = vec![0u8; MFT_HEADER_LEN];
        bytes[4..8].copy_from_slice(&1u32.to_le_bytes());
        bytes[8..12].copy_from_slice(&(entries.len() as u32).to_le_bytes());
        for (name, kind) in entries {
            bytes.extend(build_entry(name, *kind));
        }
        bytes
    }

    #[test]
    fn parses_a_raw_descriptor_without_note_header() {
        let descriptor = build_descriptor(&[("net0", 1), ("storage", 0)]);
        let manifest = parse_manifest(&descriptor).unwrap();
        assert_eq!(manifest.entries.len(), 2);
        assert_eq!(manifest.entries[0].name, "net0");
        assert_eq!(manifest.entries[0].device_type, DeviceType::NetBasic);
        assert_eq!(manifest.entries[1].device_type, DeviceType::BlockBasic);
    }

    #[test]
    fn parses_a_descriptor_wrapped_in_an_elf_note() {
        let descriptor = build_descriptor(&[("storage", 0)]);
        let mut note = vec![0u8; MFT_HEADER_LEN];
        note[0..4].copy_from_slice(&(NOTE_NAME.len() as u32).to_le_bytes());
        note[8..12].copy_from_slice(&0u32.to_le_bytes());
        note.extend(NOTE_NAME);
        while note.len() % 4 != 0 {
            note.push(0);
        }
        note.extend(descriptor);

        let manifest = parse_manifest(&note).unwrap();
        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.entries[0].name, "storage");
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut descriptor = build_descriptor(&[]);
        descriptor[4..8].copy_from_slice(&2u32.to_le_bytes());
        let err = parse_manifest(&descriptor).unwrap_err();
        assert!(matches!(err, Solo5ParseError::UnsupportedVersion(2)));
    }

    #[test]
    fn truncated_entry_table_returns_entries_parsed_so_far() {
        let mut descriptor = build_descriptor(&[("net0", 1), ("storage", 0)]);
        // Drop the second entry's bytes entirely, leaving the header's
        // `entries` count overstating what's actually present.
        descriptor.truncate(MFT_HEADER_LEN + MFT_ENTRY_LEN);
        let manifest = parse_manifest(&descriptor).unwrap();
        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.entries[0].name, "net0");
    }

    #[test]
    fn empty_entry_names_are_silently_skipped() {
        let descriptor = build_descriptor(&[("net0", 1), ("", 0), ("storage", 0)]);
        let manifest = parse_manifest(&descriptor).unwrap();
        assert_eq!(manifest.entries.len(), 2);
        assert_eq!(manifest.entries[0].name, "net0");
        assert_eq!(manifest.entries[1].name, "storage");
    }

    #[test]
    fn unknown_device_type_is_preserved() {
        let descriptor = build_descriptor(&[("weird", 42)]);
        let manifest = parse_manifest(&descriptor).unwrap();
        assert_eq!(manifest.entries[0].device_type, DeviceType::Unknown(42));
    }
}
