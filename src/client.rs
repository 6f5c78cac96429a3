//! Blocking client
//!
//! Minimal HTTP/1.1 client over one persistent TCP connection. Used by the
//! CLI, the integration tests, and the benchmarks.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::Result;
use crate::protocol::{read_response, write_request, Limits, Response};

/// A client connection to a Pear server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    limits: Limits,
}

impl Client {
    /// Connect to a server
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            limits: Limits::default(),
        })
    }

    /// Set a read timeout on the underlying socket
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        Ok(())
    }

    /// Send an arbitrary request and wait for its response
    pub fn request(&mut self, method: &str, path: &[u8], body: &[u8]) -> Result<Response> {
        write_request(&mut self.writer, method, path, body)?;
        read_response(&mut self.reader, &self.limits)
    }

    /// `PUT /{key}/`
    pub fn put(&mut self, key: &str, value: &[u8]) -> Result<Response> {
        self.request("PUT", &key_path(key), value)
    }

    /// `GET /{key}/`
    pub fn get(&mut self, key: &str) -> Result<Response> {
        self.request("GET", &key_path(key), b"")
    }

    /// `DELETE /{key}/`
    pub fn delete(&mut self, key: &str) -> Result<Response> {
        self.request("DELETE", &key_path(key), b"")
    }
}

fn key_path(key: &str) -> Vec<u8> {
    format!("/{}/", key).into_bytes()
}
