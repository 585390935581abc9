#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::SeekFrom;

    use fs_stream::{OpenMode, PipeRole, Stream, StreamError};
    use tempdir::TempDir;

    #[test]
    fn test_pipe_read_collects_child_stdout() {
        let mut stream = Stream::pipe_open("echo hello", PipeRole::Read)
            .expect("Failed to spawn child");

        let mut out = [0u8; 64];
        let len = out.len();
        let got = stream.read(&mut out, 1, len);
        assert_eq!(&out[..got], b"hello\n");
        assert!(stream.eof());

        let status = stream.pipe_close().expect("Failed to reap child");
        assert_eq!(status.code(), Some(0));
    }

    #[test]
    fn test_pipe_write_reaches_child_stdin() {
        let temp_dir = TempDir::new("fs-stream")
            .expect("Failed to create temporary directory");
        let sink = temp_dir.path().join("sink.txt");

        let command = format!("cat > {}", sink.display());
        let mut stream = Stream::pipe_open(&command, PipeRole::Write)
            .expect("Failed to spawn child");

        let payload = b"over the pipe\n";
        assert_eq!(stream.write(payload, 1, payload.len()), payload.len());

        let status = stream.pipe_close().expect("Failed to reap child");
        assert!(status.success());
        assert_eq!(fs::read(&sink).unwrap(), payload);
    }

    #[test]
    fn test_pipe_close_reports_child_failure() {
        let mut stream = Stream::pipe_open("exit 3", PipeRole::Read)
            .expect("Failed to spawn child");

        assert_eq!(stream.read_byte().unwrap(), None);
        let status = stream.pipe_close().expect("Failed to reap child");
        assert_eq!(status.code(), Some(3));
    }

    #[test]
    fn test_pipe_close_is_refused_on_regular_streams() {
        let temp_dir = TempDir::new("fs-stream")
            .expect("Failed to create temporary directory");
        let path = temp_dir.path().join("data.bin");

        let stream =
            Stream::open(&path, OpenMode::WriteTruncate).unwrap();
        assert!(matches!(
            stream.pipe_close(),
            Err(StreamError::NotPiped)
        ));
    }

    #[test]
    fn test_pipe_read_spanning_multiple_refills() {
        // Output larger than one buffer, to force several refills.
        let mut stream =
            Stream::pipe_open("seq 1 3000", PipeRole::Read)
                .expect("Failed to spawn child");

        let mut collected = Vec::new();
        loop {
            match stream.read_byte().expect("Failed to read from child") {
                Some(byte) => collected.push(byte),
                None => break,
            }
        }

        let expected: String =
            (1..=3000).map(|n| format!("{}\n", n)).collect();
        assert_eq!(collected, expected.as_bytes());

        let status = stream.pipe_close().expect("Failed to reap child");
        assert!(status.success());
    }

    #[test]
    fn test_full_file_lifecycle() {
        let temp_dir = TempDir::new("fs-stream")
            .expect("Failed to create temporary directory");
        let path = temp_dir.path().join("lifecycle.bin");

        let mut writer =
            Stream::open(&path, OpenMode::WriteTruncate).unwrap();
        writer.write(b"0123456789", 1, 10);
        assert_eq!(writer.tell().unwrap(), 10);
        writer.close().expect("Failed to close stream");

        let mut stream = Stream::open(&path, OpenMode::ReadWrite).unwrap();
        let mut head = [0u8; 4];
        assert_eq!(stream.read(&mut head, 1, 4), 4);
        assert_eq!(&head, b"0123");
        assert_eq!(stream.tell().unwrap(), 4);

        // Overwrite the middle, then verify through a fresh read pass.
        stream.seek(SeekFrom::Start(5)).unwrap();
        stream.write(b"xy", 1, 2);
        stream.seek(SeekFrom::Start(0)).unwrap();

        let mut whole = [0u8; 10];
        assert_eq!(stream.read(&mut whole, 1, 10), 10);
        assert_eq!(&whole, b"01234xy789");
        stream.close().expect("Failed to close stream");
    }
}
