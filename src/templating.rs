use std::{collections::HashMap, path::PathBuf, sync::Arc, time::SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub const INDEX_TEMPLATE: &str = "index.html.liquid";

const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[(
    INDEX_TEMPLATE,
    include_str!("../templates/index.html.liquid"),
)];

/// Loads Liquid templates from a directory, re-reading a file whenever its
/// modification time moves forward. Templates missing on disk fall back to the
/// copies compiled into the binary.
pub struct TemplateEngine {
    template_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, CachedTemplate>>>,
}

struct CachedTemplate {
    content: String,
    modified: SystemTime,
}

impl TemplateEngine {
    pub fn new(template_dir: PathBuf) -> Self {
        Self {
            template_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn load_template(&self, name: &str) -> Result<String, String> {
        let template_path = self.template_dir.join(name);

        let metadata = match tokio::fs::metadata(&template_path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                return match embedded_template(name) {
                    Some(content) => {
                        debug!("Using built-in template for {}", name);
                        Ok(content.to_string())
                    }
                    None => Err(format!("Failed to get metadata for {}: {}", name, e)),
                };
            }
        };

        let modified = metadata
            .modified()
            .map_err(|e| format!("Failed to get modified time: {}", e))?;

        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.get(name)
            && cached.modified >= modified
        {
            debug!("Using cached template for {}", name);
            return Ok(cached.content.clone());
        }

        info!("Loading template: {}", name);

        let content = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|e| format!("Failed to read template {}: {}", name, e))?;

        cache.insert(
            name.to_string(),
            CachedTemplate {
                content: content.clone(),
                modified,
            },
        );

        Ok(content)
    }

    /// Render `template_name` with `globals`. Optional `_header.html.liquid` and
    /// `_footer.html.liquid` partials are exposed as `header` and `footer`.
    pub async fn render_template(
        &self,
        template_name: &str,
        globals: liquid::Object,
    ) -> Result<String, String> {
        let template_content = self.load_template(template_name).await?;

        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(|e| format!("Failed to create parser: {}", e))?;

        let template = parser
            .parse(&template_content)
            .map_err(|e| format!("Failed to parse template: {}", e))?;

        let mut full_globals = globals;
        let partials = [("_header.html.liquid", "header"), ("_footer.html.liquid", "footer")];
        for (partial, key) in partials {
            if full_globals.contains_key(key) {
                continue;
            }
            let content = self.load_partial(partial).await;
            full_globals.insert(key.into(), liquid::model::Value::Scalar(content.into()));
        }

        template
            .render(&full_globals)
            .map_err(|e| format!("Failed to render template: {}", e))
    }

    async fn load_partial(&self, name: &str) -> String {
        if !tokio::fs::try_exists(self.template_dir.join(name))
            .await
            .unwrap_or(false)
        {
            return String::new();
        }
        self.load_template(name).await.unwrap_or_else(|e| {
            warn!("Failed to load partial {}: {}", name, e);
            String::new()
        })
    }
}

fn embedded_template(name: &str) -> Option<&'static str> {
    EMBEDDED_TEMPLATES
        .iter()
        .find(|(template, _)| *template == name)
        .map(|(_, content)| *content)
}
