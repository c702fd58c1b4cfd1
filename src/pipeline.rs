use crate::config::{AppConfig, CorruptStorePolicy};
use crate::fetch::{PageFetcher, build_fetcher};
use crate::model::{HijriDate, MergeOutcome, Store, SyncOutcome, SyncReport};
use crate::parser::extract_from_document;
use crate::store::{back_up_broken_store, load_store, save_store};
use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;
use tracing::info;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub config: AppConfig,
    pub dry_run: bool,
}

pub fn sync_hijri(options: &SyncOptions) -> Result<SyncReport> {
    let fetcher = build_fetcher(&options.config.fetch)?;
    let now = now_in_timezone(options.config.source.timezone.as_deref())?;
    sync_with_fetcher(options, fetcher.as_ref(), now)
}

/// One run: fetch, extract, merge into the store and persist it. The store is
/// only touched once a date has been extracted.
pub fn sync_with_fetcher(
    options: &SyncOptions,
    fetcher: &dyn PageFetcher,
    now: NaiveDateTime,
) -> Result<SyncReport> {
    let config = &options.config;
    let url = config.source.url.as_str();

    info!(source = %config.source.label, fetcher = fetcher.name(), %url, "sync start");
    let doc = fetcher
        .fetch(url)
        .with_context(|| format!("fetch failed for {}", config.source.label))?;

    let Some(extracted) = extract_from_document(&doc) else {
        info!(url = %doc.source_url, "no hijri date found; store left unchanged");
        return Ok(SyncReport {
            source_url: doc.source_url,
            dry_run: options.dry_run,
            outcome: SyncOutcome::NotFound,
        });
    };

    let method = extracted.method;
    let date = extracted.enrich(now);

    let mut store = load_store(
        &config.store.path,
        config.store.on_corrupt,
        &config.source.label,
    )?;
    let merge = merge_hijri_date(&mut store, date.clone(), config.store.history_limit);

    info!(
        appended = merge.appended,
        evicted = merge.evicted,
        history = store.history.len(),
        "store merge complete"
    );

    if options.dry_run {
        info!("dry run enabled; store not persisted");
    } else {
        if config.store.on_corrupt == CorruptStorePolicy::Reset {
            back_up_broken_store(&config.store.path)?;
        }
        save_store(&config.store.path, &store)?;
        info!(store = %config.store.path.display(), "store written");
    }

    Ok(SyncReport {
        source_url: doc.source_url,
        dry_run: options.dry_run,
        outcome: SyncOutcome::Updated {
            date,
            method,
            merge,
            history_len: store.history.len(),
        },
    })
}

/// Appends `date` to the history only when its day or month differs from the
/// current entry. `current` is always replaced so its timestamps stay fresh.
/// History keeps the newest `history_limit` entries.
pub fn merge_hijri_date(store: &mut Store, date: HijriDate, history_limit: usize) -> MergeOutcome {
    let is_new_day = store
        .current
        .as_ref()
        .is_none_or(|current| !current.same_day_as(&date));

    let mut outcome = MergeOutcome::default();
    if is_new_day {
        store.history.push(date.clone());
        outcome.appended = true;

        let limit = history_limit.max(1);
        if store.history.len() > limit {
            outcome.evicted = store.history.len() - limit;
            store.history.drain(..outcome.evicted);
        }
    }
    store.current = Some(date);

    outcome
}

/// Wall-clock time in `timezone`, or the host's local time when unset.
/// Truncated to microseconds, the precision stored in `updated_at`.
pub fn now_in_timezone(timezone: Option<&str>) -> Result<NaiveDateTime> {
    let now = match timezone {
        Some(name) => {
            let tz = name
                .parse::<Tz>()
                .map_err(|err| anyhow!("unknown timezone {name}: {err}"))?;
            Utc::now().with_timezone(&tz).naive_local()
        }
        None => Local::now().naive_local(),
    };
    Ok(truncate_to_micros(now))
}

fn truncate_to_micros(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(dt.nanosecond() / 1_000 * 1_000).unwrap_or(dt)
}
