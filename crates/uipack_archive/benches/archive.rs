use divan::AllocProfiler;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

pub mod read {
    use divan::Bencher;
    use flate2::{write::DeflateEncoder, Compression};
    use std::io::prelude::*;
    use uipack_archive::{CompressionMethod, PackageArchive};

    fn get_input() -> Vec<u8> {
        let mut framed = Vec::new();
        for i in 0..512 {
            let payload = format!("<component size=\"{i},{i}\"><displayList/></component>");
            write!(framed, "n{i}.xml|{}|{payload}", payload.len()).unwrap();
        }

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&framed).unwrap();
        encoder.finish().unwrap()
    }

    #[divan::bench]
    fn open(bencher: Bencher) {
        bencher.with_inputs(get_input).bench_refs(|data| {
            divan::black_box(PackageArchive::new(data, CompressionMethod::Deflate).unwrap());
        });
    }

    #[divan::bench]
    fn access_file(bencher: Bencher) {
        bencher
            .with_inputs(|| PackageArchive::new(&get_input(), CompressionMethod::Deflate).unwrap())
            .bench_refs(|archive| {
                divan::black_box(archive.by_name("n256.xml").unwrap());
            });
    }

    #[divan::bench(sample_count = 1)]
    fn read_file_all(bencher: Bencher) {
        let archive = PackageArchive::new(&get_input(), CompressionMethod::Deflate).unwrap();

        bencher.bench_local(move || {
            let mut buffer = Vec::new();
            for i in 0..archive.len() {
                let mut file = archive.by_index(i).unwrap();
                file.read_to_end(&mut buffer).unwrap();
                buffer.clear();
            }
        });
    }
}
