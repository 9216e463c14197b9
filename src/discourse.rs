// Forum-health collector: walks every category's topic listing, page by page, counting open
// and closed topics overall and in the Support category.

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::collector::{Collector, CollectorKind};
use crate::error::Result;
use crate::http::{SourceClient, Transport};
use crate::models::ForumHealth;

/// Category whose topics are tracked separately.
pub const SUPPORT_CATEGORY: &str = "Support";

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Topic {
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    category_list: CategoryList,
}

#[derive(Debug, Deserialize)]
struct CategoryList {
    #[serde(default)]
    categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
struct TopicsResponse {
    topic_list: TopicList,
}

#[derive(Debug, Deserialize)]
struct TopicList {
    #[serde(default)]
    topics: Vec<Topic>,
}

/// Running counts over the traversal; percentages are derived once at the end.
#[derive(Debug, Default, Clone, Copy)]
pub struct TopicTally {
    pub open_support: u32,
    pub total_support: u32,
    pub open_all: u32,
    pub total_all: u32,
}

impl TopicTally {
    pub fn add(&mut self, category: &Category, topic: &Topic) {
        let support = category.name == SUPPORT_CATEGORY;
        self.total_all += 1;
        if support {
            self.total_support += 1;
        }
        if !topic.closed {
            self.open_all += 1;
            if support {
                self.open_support += 1;
            }
        }
    }

    pub fn finish(self) -> ForumHealth {
        ForumHealth::from_counts(
            self.open_support,
            self.total_support,
            self.open_all,
            self.total_all,
        )
    }
}

pub struct DiscourseCollector<T> {
    client: SourceClient<T>,
}

impl<T> From<SourceClient<T>> for DiscourseCollector<T> {
    fn from(client: SourceClient<T>) -> Self {
        Self { client }
    }
}

impl<T: Transport> DiscourseCollector<T> {
    pub fn new(client: SourceClient<T>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SourceClient<T> {
        &self.client
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        let body = self.client.get_json("categories.json", &[]).await?;
        let resp: CategoriesResponse = serde_json::from_value(body)?;
        Ok(resp.category_list.categories)
    }

    /// One page of a category's topic listing. The server fixes the page size.
    pub async fn topics_page(&self, category_id: u64, page: u32) -> Result<Vec<Topic>> {
        let page = page.to_string();
        let body = self
            .client
            .get_json(&format!("c/{category_id}.json"), &[("page", page.as_str())])
            .await?;
        let resp: TopicsResponse = serde_json::from_value(body)?;
        Ok(resp.topic_list.topics)
    }
}

impl<T: Transport + Sync> Collector for DiscourseCollector<T> {
    type Metrics = ForumHealth;

    const KIND: CollectorKind = CollectorKind::Discourse;

    #[instrument(skip(self), fields(collector = "discourse"))]
    async fn collect(&self) -> Result<ForumHealth> {
        let mut tally = TopicTally::default();
        for category in self.categories().await? {
            let mut page = 0;
            loop {
                let topics = self.topics_page(category.id, page).await?;
                if topics.is_empty() {
                    break;
                }
                debug!(category = %category.name, page, topics = topics.len(), "topic page");
                for topic in &topics {
                    tally.add(&category, topic);
                }
                page += 1;
            }
        }
        let health = tally.finish();
        info!(
            open_support = health.open_support,
            total_support = health.total_support,
            open_all = health.open_all,
            total_all = health.total_all,
            "forum health collected"
        );
        Ok(health)
    }
}
