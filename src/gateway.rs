use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, Logger};
use tokio::task;

use crate::birth::BirthData;
use crate::chart;
use crate::errors::BackendError;
use crate::library::{Chart, Library};

/// Serializes every use of a [`Library`].
///
/// The library keeps one birth-data slot for the whole process, so a
/// chart request holds the lock from the first call to the last. Library
/// calls block, so the critical section runs on the blocking pool.
pub struct Gateway {
    library: Arc<Mutex<Box<dyn Library>>>,
    timeout: Option<Duration>,
}

impl Gateway {
    pub fn new(library: impl Library + 'static, timeout: Option<Duration>) -> Self {
        Gateway {
            library: Arc::new(Mutex::new(Box::new(library))),
            timeout,
        }
    }

    /// Generates a chart for `data`, waiting for any request already in
    /// progress to finish first.
    ///
    /// If the timeout expires, the caller gets an error but the critical
    /// section still runs to completion (including cleanup) before the
    /// next request can start.
    pub async fn generate(
        &self,
        logger: Arc<Logger>,
        data: BirthData,
    ) -> Result<Chart, BackendError> {
        let library = self.library.clone();

        let section = task::spawn_blocking(move || {
            // a panic inside the library poisons the lock, but every
            // section starts by clearing the slot, so the state is safe
            // to reuse
            let mut library = library.lock().unwrap_or_else(|e| e.into_inner());
            debug!(logger, "Acquired library lock");

            chart::generate(&logger, &mut **library, &data)
        });

        let joined = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, section)
                .await
                .map_err(|_| BackendError::GenerationTimedOut(timeout))?,
            None => section.await,
        };

        joined.map_err(BackendError::TaskFailed)?
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use futures::future::join_all;
    use log::{o, Discard};

    use super::*;
    use crate::birth::BirthDataRequest;
    use crate::library::mock::{Behavior, Call, MockLibrary};

    fn logger() -> Arc<Logger> {
        Arc::new(Logger::root(Discard, o!()))
    }

    fn data(name: &str, timezone: f64) -> BirthData {
        BirthData::try_from(BirthDataRequest {
            name: name.to_owned(),
            gender: "male".to_owned(),
            dob: "1984-11-02".to_owned(),
            tob: "23:15".to_owned(),
            latitude: 19.07,
            longitude: 72.88,
            timezone,
        })
        .expect("convert request")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_are_isolated() {
        let library = MockLibrary::new(Behavior::InMemory).with_delay(Duration::from_millis(20));
        let journal = library.journal();
        let gateway = Arc::new(Gateway::new(library, None));

        let names = (0..8).map(|i| format!("Person {}", i)).collect::<Vec<_>>();

        let results = join_all(names.iter().map(|name| {
            let gateway = gateway.clone();
            let data = data(name, 5.5);

            async move { gateway.generate(logger(), data).await }
        }))
        .await;

        for (name, result) in names.iter().zip(results) {
            let chart = result.expect("generate chart");
            assert_eq!(chart["birthdata"]["name"], name.as_str());
        }

        // sections never interleave: each `Clear` is followed by the
        // complete sequence for a single name
        let journal = journal.read().unwrap();
        for section in journal.calls().chunks(5) {
            assert_eq!(section[0], Call::Clear);

            match (&section[1], &section[4]) {
                (Call::Input(input), Call::Generate(generated)) => assert_eq!(input, generated),
                other => panic!("unexpected calls {:?}", other),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn timed_out_sections_still_clean_up() {
        // file mode calls `generate` twice, so the slow section takes 500ms
        let library = MockLibrary::new(Behavior::FileOnly)
            .with_delay_for("Asha", Duration::from_millis(250));
        let journal = library.journal();
        let gateway = Gateway::new(library, Some(Duration::from_millis(300)));

        assert!(matches!(
            gateway.generate(logger(), data("Asha", 5.5)).await,
            Err(BackendError::GenerationTimedOut(_))
        ));

        let chart = gateway
            .generate(logger(), data("Ravi", 5.5))
            .await
            .expect("generate after a timeout");
        assert_eq!(chart["birthdata"]["name"], "Ravi");

        let journal = journal.read().unwrap();
        let calls = journal.calls();

        let last_slow = calls
            .iter()
            .rposition(|c| *c == Call::Generate("Asha".to_owned()))
            .expect("slow section generated");
        let next = calls
            .iter()
            .position(|c| *c == Call::Input("Ravi".to_owned()))
            .expect("next section started");
        assert!(last_slow < next, "sections interleaved: {:?}", calls);

        assert_eq!(journal.output_dirs.len(), 2);
        for dir in &journal.output_dirs {
            assert!(!dir.exists(), "{} must be removed", dir.display());
        }
    }

    #[tokio::test]
    async fn lock_survives_library_panics() {
        struct Panicking;

        impl Library for Panicking {
            fn clear_birthdata(&mut self) {}

            fn input_birthdata(
                &mut self,
                _record: crate::library::BirthRecord,
            ) -> Result<(), crate::errors::LibraryError> {
                panic!("library crashed")
            }

            fn validate_birthdata(&mut self) -> Result<(), crate::errors::LibraryError> {
                Ok(())
            }

            fn is_birthdata_valid(&self) -> bool {
                false
            }

            fn get_birthdata(&self) -> Option<crate::library::BirthRecord> {
                None
            }

            fn set_output(
                &mut self,
                _path: &std::path::Path,
                _filename: &str,
            ) -> Result<(), crate::errors::LibraryError> {
                Ok(())
            }

            fn output_path(&self) -> Option<&std::path::Path> {
                None
            }

            fn generate(
                &mut self,
                _record: &crate::library::BirthRecord,
            ) -> Result<crate::library::Generated, crate::errors::LibraryError> {
                Ok(crate::library::Generated::Nothing)
            }
        }

        let gateway = Gateway::new(Panicking, None);

        for _ in 0..2 {
            assert!(matches!(
                gateway.generate(logger(), data("Asha", 5.5)).await,
                Err(BackendError::TaskFailed(_))
            ));
        }
    }
}
