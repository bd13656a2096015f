use acad_certs::certs::{CertificateRecord, CertificateRegistry};
use acad_certs::config::{Config, StoreBackend};
use acad_certs::directory::{EntityDirectory, InMemoryDirectory};
use acad_certs::metrics::MetricsReport;
use acad_certs::store::{CertificateStore, MemoryStore, SqliteStore};
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::Instant;

pub struct RegistryDemo {
    registry: Arc<CertificateRegistry>,
    config: Config,
}

impl RegistryDemo {
    pub async fn new(config: Config) -> Result<Self> {
        let (store, directory) = open_backend(&config).await?;
        let registry = Arc::new(CertificateRegistry::from_config(
            &config.registry,
            store,
            directory,
        ));
        Ok(Self { registry, config })
    }

    /// Fire `issue_requests` concurrent issuances spread over the seeded users and courses.
    pub async fn benchmark_issuance_rate(&self) -> Result<(f64, Vec<CertificateRecord>)> {
        let demo = &self.config.demo;
        let start = Instant::now();
        let mut handles = Vec::with_capacity(demo.issue_requests);

        for i in 0..demo.issue_requests {
            let registry = self.registry.clone();
            let user_id = (i as i64 % demo.users) + 1;
            let course_id = (i as i64 % demo.courses) + 1;
            handles.push(tokio::spawn(async move {
                registry.issue(user_id, course_id).await
            }));
        }

        let mut issued = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await.context("issuance task panicked")? {
                Ok(record) => issued.push(record),
                Err(e) => warn!("issuance failed: {}", e),
            }
        }

        let rate = issued.len() as f64 / start.elapsed().as_secs_f64();
        Ok((rate, issued))
    }

    /// Validate every issued code twice (second pass exercises the cache), plus
    /// a handful of codes nobody was given.
    pub async fn benchmark_validation(&self, issued: &[CertificateRecord]) -> Result<usize> {
        let mut mismatches = 0;
        for _ in 0..2 {
            for record in issued {
                let found = self.registry.validate(&record.validation_code).await?;
                if found != *record {
                    mismatches += 1;
                }
            }
        }

        for probe in ["0000-0000-0000-0000", "does-not-exist"] {
            if self.registry.validate(probe).await.is_ok() {
                mismatches += 1;
            }
        }
        Ok(mismatches)
    }

    /// Every count must agree with the length of the matching list.
    pub async fn check_counts(&self) -> Result<bool> {
        let demo = &self.config.demo;
        for user_id in 1..=demo.users {
            let listed = self.registry.list_by_user(user_id).await?.len() as u64;
            if listed != self.registry.count_by_user(user_id).await? {
                return Ok(false);
            }
        }
        for course_id in 1..=demo.courses {
            let listed = self.registry.list_by_course(course_id).await?.len() as u64;
            if listed != self.registry.count_by_course(course_id).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub async fn run(&self) -> Result<MetricsReport> {
        println!("[1/3] Issuing {} certificates...", self.config.demo.issue_requests);
        let (rate, issued) = self.benchmark_issuance_rate().await?;
        println!("      ✓ {} issued at {:.2} certs/sec\n", issued.len(), rate);

        println!("[2/3] Validating issued codes...");
        let mismatches = self.benchmark_validation(&issued).await?;
        println!("      ✓ {} mismatches\n", mismatches);

        println!("[3/3] Checking list/count agreement...");
        let consistent = self.check_counts().await?;
        println!(
            "      {} counts {}\n",
            if consistent { "✓" } else { "✗" },
            if consistent { "consistent" } else { "INCONSISTENT" }
        );

        let mut report = self.registry.metrics().snapshot();
        report.issuance_rate = rate;
        Ok(report)
    }
}

async fn open_backend(
    config: &Config,
) -> Result<(Arc<dyn CertificateStore>, Arc<dyn EntityDirectory>)> {
    let demo = &config.demo;
    match config.store.backend {
        StoreBackend::Memory => {
            info!("using in-memory certificate store");
            let store: Arc<dyn CertificateStore> = Arc::new(MemoryStore::new());
            let directory: Arc<dyn EntityDirectory> = Arc::new(InMemoryDirectory::with_entities(
                1..=demo.users,
                1..=demo.courses,
            ));
            Ok((store, directory))
        }
        StoreBackend::Sqlite => {
            let path = config
                .store
                .database_path
                .as_deref()
                .context("sqlite backend without database_path")?;
            let store = if path == Path::new(":memory:") {
                SqliteStore::open_in_memory().await?
            } else {
                SqliteStore::open(path)
                    .await
                    .with_context(|| format!("opening {}", path.display()))?
            };

            for id in 1..=demo.users {
                store.insert_user(id, &format!("user-{id}")).await?;
            }
            for id in 1..=demo.courses {
                store.insert_course(id, &format!("course-{id}")).await?;
            }

            let store = Arc::new(store);
            let directory: Arc<dyn EntityDirectory> = store.clone();
            let store: Arc<dyn CertificateStore> = store;
            Ok((store, directory))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref()).context("loading configuration")?;

    println!("\n╔═══════════════════════════════════════════════════════╗");
    println!("║          Academic Certificate Registry               ║");
    println!("╚═══════════════════════════════════════════════════════╝\n");
    println!("  → Store backend: {:?}", config.store.backend);
    println!(
        "  → {} users, {} courses",
        config.demo.users, config.demo.courses
    );
    println!(
        "  → Codes: {}x{} symbols, up to {} attempts",
        config.registry.code_groups,
        config.registry.code_group_len,
        config.registry.max_issue_attempts
    );
    println!("  → Validation cache: {} entries\n", config.registry.cache_capacity);

    let demo = RegistryDemo::new(config).await?;
    let report = demo.run().await?;
    report.print_report();

    let csv_path = &demo.config.demo.metrics_csv;
    match report.save_to_csv(csv_path) {
        Ok(()) => println!("✓ Metrics saved to {}", csv_path.display()),
        Err(e) => println!("✗ Error saving {}: {}", csv_path.display(), e),
    }

    Ok(())
}
