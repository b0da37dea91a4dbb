//! Worker pool: a fixed number of OS threads pulling chunks off a shared
//! queue, each compressing its chunk into an independent frame. Grounded
//! in `zstdmt_compress.c`'s manual job pool (a mutex-guarded queue workers
//! pull from until empty, joined via `thread::scope` instead of a
//! condvar-gated shutdown handshake) rather than a higher-level executor,
//! since nothing in the corpus pulls one in.

use std::sync::Mutex;

struct Job {
    index: usize,
    chunk: Vec<u8>,
}

struct Queue {
    jobs: Vec<Job>,
}

/// Runs `compress_chunk` across `nb_workers` threads over `chunks`,
/// returning compressed frames in the same order as `chunks`. A failure
/// in any worker is propagated to the caller once every worker has
/// either finished or failed.
pub fn run<F>(chunks: Vec<Vec<u8>>, nb_workers: usize, compress_chunk: F) -> Result<Vec<Vec<u8>>, String>
where
    F: Fn(usize, &[u8]) -> Result<Vec<u8>, String> + Sync,
{
    let nb_workers = nb_workers.max(1).min(chunks.len().max(1));
    let n = chunks.len();
    let queue = Mutex::new(Queue {
        jobs: chunks.into_iter().enumerate().map(|(index, chunk)| Job { index, chunk }).rev().collect(),
    });
    let results: Mutex<Vec<Option<Result<Vec<u8>, String>>>> = Mutex::new((0..n).map(|_| None).collect());

    std::thread::scope(|scope| {
        for _ in 0..nb_workers {
            scope.spawn(|| loop {
                let job = {
                    let mut q = queue.lock().unwrap();
                    q.jobs.pop()
                };
                let Some(job) = job else { break };
                let outcome = compress_chunk(job.index, &job.chunk);
                let mut r = results.lock().unwrap();
                r[job.index] = Some(outcome);
            });
        }
    });

    let results = results.into_inner().unwrap();
    let mut out = Vec::with_capacity(n);
    for (i, slot) in results.into_iter().enumerate() {
        match slot {
            Some(Ok(bytes)) => out.push(bytes),
            Some(Err(e)) => return Err(format!("chunk {i} failed: {e}")),
            None => return Err(format!("chunk {i} never ran")),
        }
    }
    Ok(out)
}
