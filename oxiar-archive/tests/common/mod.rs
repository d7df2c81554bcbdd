//! Hand-built archive fixtures shared by the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const MTIME: u64 = 1_700_000_000;

/// One serialized member: header, payload and pad byte.
pub fn member(name_field: &str, payload: &[u8]) -> Vec<u8> {
    let mut data = format!(
        "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n",
        name_field,
        MTIME,
        1000,
        100,
        100644,
        payload.len()
    )
    .into_bytes();
    data.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        data.push(b'\n');
    }
    data
}

/// A filename table member; special entries carry blank metadata.
pub fn name_table(names: &[&str]) -> Vec<u8> {
    let body: String = names.iter().map(|n| format!("{n}/\n")).collect();
    let mut data = format!("{:<48}{:<10}`\n", "//", body.len()).into_bytes();
    data.extend_from_slice(body.as_bytes());
    if body.len() % 2 == 1 {
        data.push(b'\n');
    }
    data
}

pub fn archive(parts: &[Vec<u8>]) -> Vec<u8> {
    let mut data = b"!<arch>\n".to_vec();
    for part in parts {
        data.extend_from_slice(part);
    }
    data
}

/// `foo`, `bar` and `baz`.
pub fn simple() -> Vec<u8> {
    archive(&[
        member("foo/", b"content foo\n"),
        member("bar/", b"content bar\n"),
        member("baz/", b"content baz\n"),
    ])
}

pub const SIMPLE: &[(&str, &[u8])] = &[
    ("foo", b"content foo\n"),
    ("bar", b"content bar\n"),
    ("baz", b"content baz\n"),
];

/// Two long names in a `//` table around one inline name.
pub fn long() -> Vec<u8> {
    archive(&[
        name_table(&["veryverylongfilename", "evenveryverylongerfilename"]),
        member("/0", b"content veryverylongfilename\n"),
        member("shortfilename/", b"content shortfilename\n"),
        member("/22", b"content evenveryverylongerfilename\n"),
    ])
}

pub const LONG: &[(&str, &[u8])] = &[
    ("veryverylongfilename", b"content veryverylongfilename\n"),
    ("shortfilename", b"content shortfilename\n"),
    (
        "evenveryverylongerfilename",
        b"content evenveryverylongerfilename\n",
    ),
];

/// A single short-named member to merge.
pub fn simple_merged() -> Vec<u8> {
    archive(&[member("quux/", b"content quux\n")])
}

/// A single long-named member to merge.
pub fn long_merged() -> Vec<u8> {
    archive(&[
        name_table(&["veryverylongmergedfilename"]),
        member("/0", b"content veryverylongmergedfilename\n"),
    ])
}

pub fn write_fixture(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}
