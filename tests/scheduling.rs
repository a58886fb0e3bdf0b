// End-to-end walk over the public surface: load a master and its variants,
// play through a variant in order, switch quality mid-stream, and shut down.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use swarmio_engine::{
    ChunkScheduler, FileDescriptor, LoaderBackend, LoaderEvent, M3u8Parser, ManifestFetcher,
    SchedulerConfig, SchedulerError,
};
use tokio::sync::mpsc;

const MASTER_URL: &str = "https://h/m.m3u8";
const MASTER: &str = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=1000000\nv1.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=2000000\nv2.m3u8\n";

const V1_URL: &str = "https://h/v1.m3u8";
const V1: &str = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:4\n\
#EXT-X-MEDIA-SEQUENCE:0\n\
#EXTINF:4.0,\nlow0.ts\n#EXTINF:4.0,\nlow1.ts\n#EXTINF:4.0,\nlow2.ts\n\
#EXT-X-ENDLIST\n";

const V2_URL: &str = "https://h/v2.m3u8";
const V2: &str = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:4\n\
#EXT-X-MEDIA-SEQUENCE:0\n\
#EXTINF:4.0,\nhi0.ts\n#EXTINF:4.0,\nhi1.ts\n#EXTINF:4.0,\nhi2.ts\n\
#EXT-X-ENDLIST\n";

#[derive(Debug, Clone)]
struct Batch {
    descriptors: Vec<FileDescriptor>,
    swarm_id: String,
    primary_url: Option<String>,
}

struct ChannelLoader {
    batches: mpsc::UnboundedSender<Batch>,
}

#[async_trait]
impl LoaderBackend for ChannelLoader {
    async fn load(
        &self,
        descriptors: Vec<FileDescriptor>,
        swarm_id: &str,
        primary_url: Option<&str>,
    ) -> Result<(), SchedulerError> {
        let _ = self.batches.send(Batch {
            descriptors,
            swarm_id: swarm_id.to_string(),
            primary_url: primary_url.map(str::to_string),
        });
        Ok(())
    }
}

struct StaticFetcher {
    manifests: HashMap<String, String>,
}

#[async_trait]
impl ManifestFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, SchedulerError> {
        self.manifests
            .get(url)
            .cloned()
            .ok_or_else(|| SchedulerError::playlist(format!("no manifest for {url}")))
    }
}

fn fetcher() -> Arc<StaticFetcher> {
    Arc::new(StaticFetcher {
        manifests: [(MASTER_URL, MASTER), (V1_URL, V1), (V2_URL, V2)]
            .into_iter()
            .map(|(url, text)| (url.to_string(), text.to_string()))
            .collect(),
    })
}

#[tokio::test]
async fn plays_through_a_variant_and_switches_quality() {
    let (batch_tx, mut batch_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::channel(16);
    let (scheduler, driver) = ChunkScheduler::spawn(
        Arc::new(ChannelLoader { batches: batch_tx }),
        event_rx,
        fetcher(),
        Arc::new(M3u8Parser),
        SchedulerConfig::default(),
    );

    let master_text = scheduler.load_playlist(MASTER_URL, true).await.unwrap();
    assert_eq!(master_text, MASTER);

    // play the low variant in order
    for (i, url) in ["https://h/low0.ts", "https://h/low1.ts", "https://h/low2.ts"]
        .iter()
        .enumerate()
    {
        let pending = scheduler.request_chunk(url).await.unwrap();
        let batch = batch_rx.recv().await.unwrap();
        assert_eq!(batch.swarm_id, "https://h/m.m3u8+0");
        assert_eq!(batch.primary_url.as_deref(), Some(*url));
        assert_eq!(batch.descriptors.len(), 3 - i);
        // the requested chunk always heads the batch with the lowest priority
        assert_eq!(batch.descriptors[0].url, *url);
        assert!(
            batch
                .descriptors
                .windows(2)
                .all(|w| w[1].priority == w[0].priority + 1)
        );

        event_tx
            .send(LoaderEvent::Loaded {
                url: url.to_string(),
                payload: Bytes::from_static(b"chunk"),
            })
            .await
            .unwrap();
        assert_eq!(pending.await.unwrap(), Bytes::from_static(b"chunk"));
    }

    // quality switch: new swarm position, priorities reset with the queue
    let pending = scheduler.request_chunk("https://h/hi1.ts").await.unwrap();
    let batch = batch_rx.recv().await.unwrap();
    assert_eq!(batch.swarm_id, "https://h/m.m3u8+1");
    assert_eq!(
        batch.descriptors[0],
        FileDescriptor {
            url: "https://h/hi1.ts".to_string(),
            priority: 0,
        }
    );

    event_tx
        .send(LoaderEvent::Loaded {
            url: "https://h/hi1.ts".to_string(),
            payload: Bytes::from_static(b"switched"),
        })
        .await
        .unwrap();
    assert_eq!(pending.await.unwrap(), Bytes::from_static(b"switched"));

    scheduler.shutdown();
    driver.await.unwrap();
}

#[tokio::test]
async fn dropping_every_handle_stops_the_driver() {
    let (batch_tx, _batch_rx) = mpsc::unbounded_channel();
    let (_event_tx, event_rx) = mpsc::channel(16);
    let (scheduler, driver) = ChunkScheduler::spawn(
        Arc::new(ChannelLoader { batches: batch_tx }),
        event_rx,
        fetcher(),
        Arc::new(M3u8Parser),
        SchedulerConfig::default(),
    );

    drop(scheduler);
    driver.await.unwrap();
}
