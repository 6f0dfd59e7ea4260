use std::sync::Arc;

use cvault_crypto::chunk::CLEARTEXT_CHUNK_SIZE;
use cvault_crypto::{
    ansi_x963_sha256_kdf, FileContentCryptor, FileHeaderCryptor, FileNameCryptor,
    KeyDerivationFunction, Masterkey,
};
use cvault_core::NameEncoding;

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [1024, 8192, CLEARTEXT_CHUNK_SIZE])]
fn bench_encrypt_chunk(bencher: divan::Bencher, size: usize) {
    let header = FileHeaderCryptor::new(Arc::new(Masterkey::generate()), -1).create();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            FileContentCryptor
                .encrypt_chunk(divan::black_box(&data), 0, divan::black_box(&header))
                .unwrap()
        });
}

#[divan::bench(args = [1024, 8192, CLEARTEXT_CHUNK_SIZE])]
fn bench_decrypt_chunk(bencher: divan::Bencher, size: usize) {
    let header = FileHeaderCryptor::new(Arc::new(Masterkey::generate()), -1).create();
    let data = make_data(size);
    let encrypted = FileContentCryptor.encrypt_chunk(&data, 0, &header).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            FileContentCryptor
                .decrypt_chunk(divan::black_box(&encrypted), 0, divan::black_box(&header), true)
                .unwrap()
        });
}

#[divan::bench]
fn bench_decrypt_header(bencher: divan::Bencher) {
    let headers = FileHeaderCryptor::new(Arc::new(Masterkey::generate()), -1);
    let stored = headers.encrypt_header(&headers.create()).unwrap();
    bencher.bench(|| headers.decrypt_header(divan::black_box(&stored)).unwrap());
}

#[divan::bench]
fn bench_encrypt_filename(bencher: divan::Bencher) {
    let names = FileNameCryptor::new(Arc::new(Masterkey::generate()), NameEncoding::Base64url);
    let dir_id = b"3f1c2a4e-9d1b-4c55-8e0f-2b7a6d9c1e00";
    bencher.bench(|| {
        names
            .encrypt_filename(divan::black_box("quarterly-report.pdf"), &[dir_id.as_slice()])
            .unwrap()
    });
}

#[divan::bench(args = [32, 256])]
fn bench_x963_kdf(bencher: divan::Bencher, key_len: usize) {
    let kdf = ansi_x963_sha256_kdf();
    let secret = make_data(48);
    bencher.bench(|| kdf.derive_key(divan::black_box(&secret), key_len).unwrap());
}

fn main() {
    divan::main();
}
