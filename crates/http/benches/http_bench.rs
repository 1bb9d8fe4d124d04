use bytes::BytesMut;
use criterion::{Criterion, criterion_group, criterion_main};
use futures::executor::block_on;
use http::StatusCode;
use raw_http::codec::{RequestDecoder, ResponseEncoder, ResponseItem};
use raw_http::connection::{HttpConnection, ResponseWriter};
use raw_http::handler::make_handler;
use raw_http::protocol::{Request, SendError, default_headers};
use std::hint::black_box;
use std::{
    io,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_util::codec::{Decoder, Encoder};

const REQUEST: &[u8] = b"GET / HTTP/1.1\r\nHost: localhost:42069\r\nUser-Agent: curl/7.81.0\r\nAccept: */*\r\n\r\n";

// Mock IO handing out reads of at most `chunk` bytes
#[derive(Clone)]
struct MockIO {
    read_data: Vec<u8>,
    write_data: Vec<u8>,
    read_pos: usize,
    chunk: usize,
}

impl MockIO {
    fn new(read_data: Vec<u8>, chunk: usize) -> Self {
        Self { read_data, write_data: Vec::new(), read_pos: 0, chunk }
    }
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = &self.read_data[self.read_pos..];
        let amt = remaining.len().min(buf.remaining()).min(self.chunk);
        buf.put_slice(&remaining[..amt]);
        self.read_pos += amt;
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockIO {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
        self.write_data.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}

async fn hello_handler(writer: ResponseWriter<MockIO>, _request: Request) -> Result<(), SendError> {
    let body = b"Hello World!";
    let writer = writer.write_status_line(StatusCode::OK).await?;
    let mut writer = writer.write_headers(&default_headers(body.len())).await?;
    writer.write_body(body).await?;
    Ok(())
}

fn bench_request_decoder(c: &mut Criterion) {
    c.bench_function("decode_simple_request", |b| {
        b.iter(|| {
            let mut decoder = RequestDecoder::new();
            let mut bytes = BytesMut::from(REQUEST);
            black_box(decoder.decode(&mut bytes).unwrap());
        });
    });

    c.bench_function("advance_byte_by_byte", |b| {
        b.iter(|| {
            let mut decoder = RequestDecoder::new();
            let mut bytes = BytesMut::new();
            for byte in REQUEST {
                bytes.extend_from_slice(&[*byte]);
                decoder.advance_buffered(&mut bytes).unwrap();
            }
            black_box(decoder.take_request().unwrap());
        });
    });
}

fn bench_response_encoder(c: &mut Criterion) {
    let headers = default_headers(12);

    c.bench_function("encode_simple_response", |b| {
        b.iter(|| {
            let mut encoder = ResponseEncoder::new();
            let mut bytes = BytesMut::new();
            encoder.encode(ResponseItem::StatusLine(StatusCode::OK), &mut bytes).unwrap();
            encoder.encode(ResponseItem::Headers(&headers), &mut bytes).unwrap();
            encoder.encode(ResponseItem::Body(b"Hello World!"), &mut bytes).unwrap();
            black_box(bytes);
        });
    });
}

fn bench_http_connection(c: &mut Criterion) {
    let handler = Arc::new(make_handler(hello_handler));

    c.bench_function("process_simple_request", |b| {
        b.iter(|| {
            let reader = MockIO::new(REQUEST.to_vec(), 8);
            let writer = MockIO::new(Vec::new(), 8);
            let connection = HttpConnection::new(reader, writer);
            black_box(block_on(connection.process(Arc::clone(&handler))).unwrap());
        });
    });
}

criterion_group!(benches, bench_request_decoder, bench_response_encoder, bench_http_connection);
criterion_main!(benches);
