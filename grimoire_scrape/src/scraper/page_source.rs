use super::ScrapeError;
use grimoire::{ConfigError, RequestOptions};
use http::{header::USER_AGENT, HeaderMap, HeaderValue};
use reqwest::blocking::{Client, Response};

/// Somewhere wiki pages can be read from
pub trait PageSource {
    /// Returns the body of the page at the url
    fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

impl<S: PageSource + ?Sized> PageSource for &S {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        (**self).fetch(url)
    }
}

/// Reads pages from the live wiki, one blocking request at a time
pub struct HttpSource {
    client: Client,
    headers: HeaderMap,
    /// Number of times to try a url before giving up
    max_retries: u8,
}

impl HttpSource {
    pub fn new(options: &RequestOptions) -> Result<HttpSource, ScrapeError> {
        let client = Client::builder()
            .timeout(options.timeout())
            .build()
            .map_err(ScrapeError::Client)?;

        let mut headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&options.user_agent).map_err(|_| {
            ConfigError::Invalid(format!(
                "'{}' can't be sent as a user agent",
                options.user_agent
            ))
        })?;
        headers.insert(USER_AGENT, user_agent);

        Ok(HttpSource {
            client,
            headers,
            max_retries: options.max_retries.max(1),
        })
    }

    // Only failures to get any response at all are retried, a bad status is final
    fn retry_get_request(&self, url: &str) -> Result<Response, reqwest::Error> {
        let mut retries = 0;

        loop {
            let response = self.client.get(url).headers(self.headers.clone()).send();

            match response {
                Ok(value) => return Ok(value),
                Err(err) => {
                    retries += 1;
                    if retries >= self.max_retries {
                        return Err(err);
                    }
                    tracing::debug!(%url, attempt = retries, error = %err, "request failed, retrying");
                }
            }
        }
    }
}

impl PageSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        tracing::debug!(%url, "request sent");
        let response = self
            .retry_get_request(url)
            .map_err(|source| ScrapeError::Web {
                url: String::from(url),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: String::from(url),
                status,
            });
        }

        response.text().map_err(|source| ScrapeError::Web {
            url: String::from(url),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_defaults() {
        let source = HttpSource::new(&RequestOptions::default()).expect("Test failed");
        assert_eq!(source.max_retries, 3);
        assert_eq!(source.headers.get(USER_AGENT).unwrap(), "Mozilla/5.0");
    }

    #[test]
    fn rejects_unsendable_user_agent() {
        let options = RequestOptions {
            user_agent: String::from("bad\nagent"),
            ..RequestOptions::default()
        };

        assert!(matches!(
            HttpSource::new(&options),
            Err(ScrapeError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn unreachable_host_is_a_web_error() {
        let options = RequestOptions {
            timeout_secs: 2,
            max_retries: 1,
            ..RequestOptions::default()
        };
        let source = HttpSource::new(&options).expect("Test failed");

        // Port 9 on localhost is the discard service, which is essentially never listening
        match source.fetch("http://127.0.0.1:9/spells") {
            Err(ScrapeError::Web { url, .. }) => assert_eq!(url, "http://127.0.0.1:9/spells"),
            other => panic!("expected a web error, got {:?}", other),
        }
    }
}
