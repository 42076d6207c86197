// Copyright (c) 2022-2023 The MobileCoin Foundation

/// Copy a slice into the output buffer at the provided index, returning the new index
pub(crate) fn put(buff: &mut [u8], index: usize, d: &[u8]) -> usize {
    buff[index..][..d.len()].copy_from_slice(d);
    index + d.len()
}

/// Read a fixed length array from the input buffer at the provided index
pub(crate) fn take<const N: usize>(buff: &[u8], index: usize) -> [u8; N] {
    let mut d = [0u8; N];
    d.copy_from_slice(&buff[index..][..N]);
    d
}
