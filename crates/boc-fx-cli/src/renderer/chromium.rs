//! Chromium page driver using chromiumoxide.

use super::{find_chromium, scripts, BrowserOptions};
use anyhow::{Context, Result};
use async_trait::async_trait;
use boc_fx::{ClickOptions, DriverError, DriverResult, Locator, PageDriver};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One Chromium instance with a single tab.
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    options: BrowserOptions,
}

impl ChromiumDriver {
    /// Launch Chromium and open a blank tab.
    pub async fn launch(options: BrowserOptions) -> Result<Self> {
        let chrome_path = find_chromium(options.chromium_path.as_deref()).context(
            "Chromium not found. Set BOCFX_CHROMIUM_PATH or `chromium_path` in the config.",
        )?;
        tracing::debug!("Launching {}", chrome_path.display());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        Ok(Self {
            browser,
            page,
            handler,
            options,
        })
    }

    /// Close the tab and the browser.
    pub async fn close(mut self) -> Result<()> {
        let _ = self.page.clone().close().await;
        self.browser
            .close()
            .await
            .context("failed to close Chromium")?;
        let _ = self.browser.wait().await;
        self.handler.abort();
        Ok(())
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> DriverResult<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| DriverError::Script(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| DriverError::Script(format!("failed to convert JS result: {e}")))
    }

    async fn element(&self, selector: &str) -> DriverResult<Element> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| DriverError::ElementNotFound {
                locator: Locator::css(selector),
            })
    }

    /// Give a page reload triggered by the last action time to start.
    async fn settle(&self) {
        if !self.options.settle.is_zero() {
            tokio::time::sleep(self.options.settle).await;
        }
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        let timeout_ms = self.options.wait_timeout.as_millis() as u64;
        match tokio::time::timeout(self.options.wait_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {
                if let Err(e) = self.page.wait_for_navigation().await {
                    tracing::debug!("Waiting for {url} to finish loading failed: {e}");
                }
                Ok(())
            }
            Ok(Err(e)) => Err(DriverError::Navigation(format!("{url}: {e}"))),
            Err(_) => Err(DriverError::Navigation(format!(
                "{url}: timed out after {timeout_ms}ms"
            ))),
        }
    }

    async fn wait_for(&mut self, locator: &Locator) -> DriverResult<()> {
        let deadline = Instant::now() + self.options.wait_timeout;
        loop {
            // The probe fails while a reload replaces the document; that is "not yet".
            match self.eval::<bool>(scripts::exists(locator)).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => tracing::trace!("Probe for {locator} failed: {e}"),
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    locator: locator.clone(),
                    timeout_ms: self.options.wait_timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&mut self, selector: &str, options: ClickOptions) -> DriverResult<()> {
        let element = self.element(selector).await?;
        if options.click_count >= 3 {
            if !self.eval::<bool>(scripts::select_contents(selector)).await? {
                return Err(DriverError::ElementNotFound {
                    locator: Locator::css(selector),
                });
            }
            return Ok(());
        }

        for _ in 0..options.click_count.max(1) {
            element
                .click()
                .await
                .map_err(|e| DriverError::Script(format!("click on {selector}: {e}")))?;
        }
        self.settle().await;
        Ok(())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> DriverResult<()> {
        let element = self.element(selector).await?;
        element
            .type_str(text)
            .await
            .map_err(|e| DriverError::Script(format!("typing into {selector}: {e}")))?;
        Ok(())
    }

    async fn select_option(&mut self, selector: &str, value: &str) -> DriverResult<()> {
        if !self
            .eval::<bool>(scripts::select_option(selector, value))
            .await?
        {
            return Err(DriverError::ElementNotFound {
                locator: Locator::css(format!("{selector} option[value='{value}']")),
            });
        }
        self.settle().await;
        Ok(())
    }

    async fn extract_text(&mut self, locator: &Locator) -> DriverResult<Vec<String>> {
        self.eval(scripts::read_property(locator, "innerHTML")).await
    }

    async fn extract_property(
        &mut self,
        locator: &Locator,
        property: &str,
    ) -> DriverResult<Vec<String>> {
        self.eval(scripts::read_property(locator, property)).await
    }
}
