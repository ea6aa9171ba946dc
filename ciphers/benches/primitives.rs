criterion::criterion_main!(aead::benches, generichash::benches, guarded::benches);

fn benchid(base: KvPairs, last: KvPairs) -> String {
    format!("{base},{last}")
}

#[derive(Clone, Copy, Debug)]
struct KvPair<'a>(&'a str, &'a str);

impl std::fmt::Display for KvPair<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{k}={v}", k = self.0, v = self.1)
    }
}

#[derive(Clone, Copy, Debug)]
struct KvPairs<'a>(&'a [KvPair<'a>]);

impl std::fmt::Display for KvPairs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut delim = "";
        for pair in self.0 {
            write!(f, "{delim}{pair}")?;
            delim = ",";
        }
        Ok(())
    }
}

mod aead {
    criterion::criterion_group!(benches, bench_xchachapoly);

    use criterion::Criterion;
    use sodalock_ciphers::{LibSodium, XChaCha20Poly1305Ietf};

    fn bench_xchachapoly(c: &mut Criterion) {
        use crate::{benchid, KvPair, KvPairs};

        let sodium = LibSodium::init().unwrap();
        let aead = XChaCha20Poly1305Ietf::new(sodium);
        let mut key = aead.keygen().unwrap();
        let nonce = sodium.random_bytes(aead.nonce_bytes());

        let base = [
            KvPair("primitive", "aead"),
            KvPair("algorithm", "xchacha20poly1305"),
        ];
        let aead_benchid = |op, len| {
            benchid(
                KvPairs(&base),
                KvPairs(&[KvPair("operation", op), KvPair("length", len)]),
            )
        };

        for (len, name) in [(32, "32byte"), (1024, "1k")] {
            let ptxt = vec![34u8; len];
            let ctxt = aead.encrypt(&ptxt, &nonce, &mut key, None).unwrap();

            c.bench_function(&aead_benchid("encrypt", name), |bench| {
                bench.iter(|| aead.encrypt(&ptxt, &nonce, &mut key, None).unwrap());
            });

            c.bench_function(&aead_benchid("decrypt", name), |bench| {
                bench.iter(|| aead.decrypt(&ctxt, &nonce, &mut key, None).unwrap());
            });
        }
    }
}

mod generichash {
    criterion::criterion_group!(benches, bench_blake2b);

    use criterion::Criterion;
    use sodalock_ciphers::{GenericHash, LibSodium};

    fn bench_blake2b(c: &mut Criterion) {
        use crate::{benchid, KvPair, KvPairs};

        let hash = GenericHash::new(LibSodium::init().unwrap());
        let mut key = hash.keygen().unwrap();
        let data = [34u8; 32];

        let base = [
            KvPair("primitive", "keyed_hash"),
            KvPair("algorithm", "blake2b"),
            KvPair("length", "32byte"),
        ];

        c.bench_function(
            &benchid(KvPairs(&base), KvPairs(&[KvPair("keyed", "false")])),
            |bench| bench.iter(|| hash.hash(&data, None, None).unwrap()),
        );

        c.bench_function(
            &benchid(KvPairs(&base), KvPairs(&[KvPair("keyed", "true")])),
            |bench| bench.iter(|| hash.hash(&data, None, Some(&mut key)).unwrap()),
        );
    }
}

/// Cost of the guarded heap itself: allocation and one unlock scope
mod guarded {
    criterion::criterion_group!(benches, bench_alloc, bench_unlock);

    use criterion::Criterion;
    use sodalock_ciphers::LibSodium;
    use sodalock_secret_memory::{GuardedPtr, Protection, SecureKey};

    fn bench_alloc(c: &mut Criterion) {
        let sodium = LibSodium::init().unwrap();
        c.bench_function("primitive=guarded_ptr,operation=alloc,length=32byte", |bench| {
            bench.iter(|| GuardedPtr::<u8>::alloc(sodium, 32, Protection::NoAccess, true).unwrap());
        });
    }

    fn bench_unlock(c: &mut Criterion) {
        let sodium = LibSodium::init().unwrap();
        let mut key = SecureKey::random(sodium, 32).unwrap();
        c.bench_function("primitive=secure_key,operation=run_unlocked,length=32byte", |bench| {
            bench.iter(|| {
                key.run_unlocked(|k| Ok::<_, sodalock_secret_memory::GuardedError>(k.as_ptr()))
                    .unwrap()
            });
        });
    }
}
