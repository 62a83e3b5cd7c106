// End-to-end demo: a client and server exchanging interned strings over a
// filtered TCP connection, with the server resolving ids from a sorted index.
//
// Run with: RUST_LOG=debug cargo run --example pipeline

use anyhow::{Context, Result};
use lexwire::codec::{Payload, WireRead, WireWrite};
use lexwire::filter::{DefaultFilterFactory, FilterFactory, OutputStage};
use lexwire::index::{CachingIndex, FixedBytes};
use lexwire::intern::{string_io, PeerRole, StringIo};
use lexwire::{FilterOptions, StreamFilter};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::thread;

const CONCEPTS: &[(i64, &str)] = &[
    (138875005, "SNOMED CT Concept"),
    (404684003, "Clinical finding"),
    (71388002, "Procedure"),
    (123037004, "Body structure"),
];

fn negotiated_options() -> Result<FilterOptions> {
    let options = FilterOptions::from_json(
        r#"{
            "obfuscation_key": [115, 104, 97, 114, 101, 100],
            "digest": "Crc32",
            "string_io": "Interning"
        }"#,
    )?;
    Ok(options)
}

fn run_server(listener: TcpListener, index_path: std::path::PathBuf) -> Result<()> {
    let options = negotiated_options()?;
    let chain = DefaultFilterFactory.create(&options)?;
    let strings = string_io(options.string_io, PeerRole::Server);
    let mut index = CachingIndex::<i64, FixedBytes<32>>::open(&index_path)?;

    let (stream, peer) = listener.accept()?;
    log::info!("Server accepted connection from {}", peer);
    let shutdown = stream.try_clone()?;
    let mut input = chain.wrap_input_raw(stream.try_clone()?)?;
    let mut out = chain.wrap_output_raw(stream)?;

    let count = input.read_int()?;
    let mut answers = Vec::new();
    for _ in 0..count {
        let system = strings.read(&mut input)?;
        let id = input.read_long()?;
        let display = index
            .get(&id)?
            .map(|name| String::from_utf8_lossy(name.as_bytes()).trim_end_matches('\0').to_string());
        answers.push((system, display));
    }

    out.write_int(answers.len() as i32)?;
    for (system, display) in &answers {
        strings.write(&mut out, system.as_deref())?;
        out.write_string(display.as_deref())?;
    }
    out.write_payload(Some(&Payload::Long(index.stats().lookups as i64)))?;
    out.finish()?;
    shutdown.shutdown(Shutdown::Write)?;

    log::info!("Server cache stats: {:?}", index.stats());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let dir = tempfile::TempDir::new()?;
    let index_path = dir.path().join("concepts.idx");
    {
        let mut index = CachingIndex::<i64, FixedBytes<32>>::open(&index_path)?;
        for (id, name) in CONCEPTS.iter().rev() {
            index.put(*id, FixedBytes::from_slice(name.as_bytes()))?;
        }
        index.into_inner().sync()?;
    }

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let server = thread::spawn(move || run_server(listener, index_path));

    let options = negotiated_options()?;
    let chain = DefaultFilterFactory.create(&options)?;
    let strings = string_io(options.string_io, PeerRole::Client);
    let digest = chain.digest_handle().context("digest stage missing")?;

    let stream = TcpStream::connect(addr)?;
    let shutdown = stream.try_clone()?;
    let mut out = chain.wrap_output_raw(stream.try_clone()?)?;

    let system = "http://snomed.info/sct";
    let lookups = [138875005, 71388002, 999999999, 404684003];
    out.write_int(lookups.len() as i32)?;
    for id in lookups {
        strings.write(&mut out, Some(system))?;
        out.write_long(id)?;
    }
    out.finish()?;
    shutdown.shutdown(Shutdown::Write)?;
    println!("Request digest: {:02x?}", digest.digest());

    let mut input = chain.wrap_input_raw(stream)?;
    let count = input.read_int()?;
    for id in lookups.iter().take(count as usize) {
        let system = strings.read(&mut input)?;
        let display = input.read_string()?;
        println!("{} | {} => {}", system.as_deref().unwrap_or("-"), id, display.as_deref().unwrap_or("<unknown>"));
    }
    if let Some(Payload::Long(lookups)) = input.read_payload(None)? {
        println!("Server performed {} index lookups", lookups);
    }

    server.join().map_err(|_| anyhow::anyhow!("server thread panicked"))??;
    Ok(())
}
