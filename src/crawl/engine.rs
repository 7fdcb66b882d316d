// src/crawl/engine.rs
// =============================================================================
// The crawl loop.
//
// States: Idle -> Running -> Draining -> Terminated
//
// - Idle -> Running: make sure the cache directory exists (fatal if not),
//   report "started", submit the seed
// - Draining: wait for the next finished task, spawn whatever it discovered,
//   repeat. Tasks keep adding work while we drain, so "done" is decided after
//   every completion, never up front
// - Terminated: nothing outstanding; close the pool, report "finished"
//
// Outstanding tasks live in a JoinSet (join_next hands them back in
// completion order). A semaphore caps how many fetch at once. Each task is
// wrapped in catch_unwind so one panicking page is reported and counted
// instead of taking the crawl down.
// =============================================================================

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};
use url::Url;

use crate::checker::{HttpSource, PageSource};
use crate::config::CrawlConfig;
use crate::crawl::cache::PageCache;
use crate::crawl::graph::LinkGraph;
use crate::crawl::summary::{BrokenLink, CrawlSummary};
use crate::crawl::task::{CrawlContext, FetchTask, Progress, VisitOutcome};
use crate::error::CrawlError;
use crate::report::ReportSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    Running,
    Draining,
    Terminated,
}

// Why a task produced no outcome
enum TaskFailure {
    Panicked(String),
    PoolClosed,
}

// What a worker hands back to the loop
struct Completion {
    task: FetchTask,
    result: Result<VisitOutcome, TaskFailure>,
}

pub struct CrawlEngine {
    ctx: Arc<CrawlContext>,
    workers: Arc<Semaphore>,
    tasks: JoinSet<Completion>,
    state: EngineState,
}

impl CrawlEngine {
    pub fn new(
        config: CrawlConfig,
        source: Arc<dyn PageSource>,
        reporter: Arc<dyn ReportSink>,
    ) -> Self {
        let ctx = CrawlContext {
            home: config.seed,
            cache: PageCache::new(config.caching, source),
            graph: LinkGraph::new(),
            reporter,
            excluded_hosts: config.excluded_hosts,
            progress: Progress::default(),
        };

        Self {
            ctx: Arc::new(ctx),
            workers: Arc::new(Semaphore::new(config.workers.max(1))),
            tasks: JoinSet::new(),
            state: EngineState::Idle,
        }
    }

    /// Engine fetching over HTTP with the configured timeout and user agent.
    pub fn with_http(config: CrawlConfig, reporter: Arc<dyn ReportSink>) -> Result<Self, CrawlError> {
        let source = HttpSource::new(config.timeout, &config.user_agent)?;
        Ok(Self::new(config, Arc::new(source), reporter))
    }

    /// Crawl from the seed until no work is left.
    ///
    /// Only setup failures are errors; broken links, malformed hrefs and
    /// failed tasks are reported as they happen and collected in the summary.
    pub async fn run(mut self) -> Result<CrawlSummary, CrawlError> {
        self.ctx.cache.ensure_dir().await?;

        self.transition(EngineState::Running);
        self.ctx.reporter.started();
        info!("crawling from {}", self.ctx.home);

        let seed = self.ctx.home.clone();
        self.submit(seed, None);

        self.transition(EngineState::Draining);
        let mut summary = CrawlSummary::default();
        let mut broken = Vec::new();

        while let Some(joined) = self.tasks.join_next().await {
            self.ctx.progress.completed();
            summary.completed += 1;

            match joined {
                Ok(Completion {
                    task,
                    result: Ok(outcome),
                }) => match outcome {
                    VisitOutcome::Crawled {
                        discovered,
                        bad_links,
                    } => {
                        for link in discovered {
                            self.spawn(FetchTask::new(link, Some(task.uri.clone())));
                        }
                        summary.bad_syntax.extend(bad_links);
                    }
                    VisitOutcome::OffSite => {}
                    VisitOutcome::Broken { cause } => broken.push((task.uri, cause.to_string())),
                },
                Ok(Completion {
                    task,
                    result: Err(failure),
                }) => {
                    let error = match failure {
                        TaskFailure::Panicked(message) => CrawlError::TaskPanicked {
                            uri: task.uri.to_string(),
                            message,
                        },
                        TaskFailure::PoolClosed => {
                            CrawlError::TaskAborted(format!("worker pool closed before {}", task.uri))
                        }
                    };
                    self.ctx.reporter.error(&error);
                    summary.errors += 1;
                }
                Err(join_error) => {
                    self.ctx
                        .reporter
                        .error(&CrawlError::TaskAborted(join_error.to_string()));
                    summary.errors += 1;
                }
            }
        }

        self.shutdown().await;

        // Every page is in the graph by now, so referrer lists are complete
        summary.broken = broken
            .into_iter()
            .map(|(target, cause)| BrokenLink {
                referrers: self.ctx.graph.referrers(&target),
                target,
                cause,
            })
            .collect();
        summary.broken.sort_by(|a, b| a.target.cmp(&b.target));

        info!(
            "crawl finished: {} pages ({} urls, {} links), {} broken, {} bad syntax, {} errors",
            summary.completed,
            self.ctx.graph.visited_count(),
            self.ctx.graph.edge_count(),
            summary.broken.len(),
            summary.bad_syntax.len(),
            summary.errors
        );
        self.ctx.reporter.finished();

        Ok(summary)
    }

    // Claim `uri` and schedule it. No-op if it was already claimed.
    fn submit(&mut self, uri: Url, referrer: Option<Url>) -> bool {
        if !self.ctx.graph.try_visit(&uri) {
            return false;
        }
        self.spawn(FetchTask::new(uri, referrer));
        true
    }

    // Schedule a task whose URI is already claimed in the visited set
    fn spawn(&mut self, task: FetchTask) {
        self.ctx.progress.submitted();
        debug!("submitting {}", task.uri);

        let ctx = Arc::clone(&self.ctx);
        let workers = Arc::clone(&self.workers);

        self.tasks.spawn(async move {
            let result = match workers.acquire_owned().await {
                Ok(_permit) => AssertUnwindSafe(task.run(&ctx))
                    .catch_unwind()
                    .await
                    .map_err(|panic| TaskFailure::Panicked(panic_message(panic.as_ref()))),
                Err(_) => Err(TaskFailure::PoolClosed),
            };
            Completion { task, result }
        });
    }

    async fn shutdown(&mut self) {
        self.workers.close();
        self.tasks.shutdown().await;
        self.transition(EngineState::Terminated);
    }

    fn transition(&mut self, next: EngineState) {
        debug!("engine {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
