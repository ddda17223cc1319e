//! Hosted backend speaking PostgREST over HTTPS.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::api_types::{
  ApiErrorBody, ApiFamilyRow, ApiHeartbeat, ApiItemPatch, ApiItemRow, ApiMemberRow, ApiNewItem,
  ApiNewMember, ApiUrgentNotice, FAMILIES_TABLE, ITEMS_TABLE, MEMBERS_TABLE,
};
use super::error::{RemoteError, ValidationError};
use super::remote::{FamilyDirectory, Notifier, RemoteStore};
use super::types::{is_valid_family_code, random_family_code, Family, Item, User};

const CODE_ATTEMPTS: usize = 5;

/// PostgREST client for items, families and members
#[derive(Clone)]
pub struct RestBackend {
  client: Client,
  base: Url,
  api_key: String,
  presence_window: ChronoDuration,
}

impl RestBackend {
  pub fn new(base_url: &str, api_key: &str) -> Result<Self, RemoteError> {
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let client = Client::builder()
      .user_agent(concat!("famlist/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      client,
      base,
      api_key: api_key.to_string(),
      presence_window: ChronoDuration::minutes(5),
    })
  }

  pub fn with_presence_window(mut self, window: ChronoDuration) -> Self {
    self.presence_window = window;
    self
  }

  /// `rest/v1/<table>` with `column=eq.value` filters applied.
  fn table_url(&self, table: &str, filters: &[(&str, &str)]) -> Result<Url, RemoteError> {
    let mut url = self.base.join(&format!("rest/v1/{}", table))?;
    if !filters.is_empty() {
      let mut query = url.query_pairs_mut();
      for (column, value) in filters {
        query.append_pair(column, &format!("eq.{}", value));
      }
    }
    Ok(url)
  }

  fn request(&self, method: Method, url: Url) -> RequestBuilder {
    self
      .client
      .request(method, url)
      .header("apikey", &self.api_key)
      .bearer_auth(&self.api_key)
  }

  /// Request that asks PostgREST to echo affected rows.
  fn returning(&self, method: Method, url: Url) -> RequestBuilder {
    self
      .request(method, url)
      .header("Prefer", "return=representation")
  }

  async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, RemoteError> {
    let body = Self::send_raw(builder).await?;
    Ok(serde_json::from_slice(&body)?)
  }

  /// Send and map non-2xx statuses to errors, returning the raw body.
  async fn send_raw(builder: RequestBuilder) -> Result<Vec<u8>, RemoteError> {
    let response = builder.send().await?;
    let status = response.status();
    let body = response.bytes().await?.to_vec();

    if !status.is_success() {
      let message = serde_json::from_slice::<ApiErrorBody>(&body)
        .map(|e| e.summary())
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
      return Err(match status.as_u16() {
        401 | 403 => RemoteError::Rejected(message),
        404 => RemoteError::NotFound(message),
        code => RemoteError::Http {
          status: code,
          message,
        },
      });
    }
    Ok(body)
  }

  async fn select<T: DeserializeOwned>(
    &self,
    table: &str,
    filters: &[(&str, &str)],
    order: Option<&str>,
  ) -> Result<Vec<T>, RemoteError> {
    let mut url = self.table_url(table, filters)?;
    url.query_pairs_mut().append_pair("select", "*");
    if let Some(order) = order {
      url.query_pairs_mut().append_pair("order", order);
    }
    Self::send(self.request(Method::GET, url)).await
  }

  async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
    &self,
    table: &str,
    body: &B,
  ) -> Result<T, RemoteError> {
    let url = self.table_url(table, &[])?;
    let rows: Vec<T> = Self::send(self.returning(Method::POST, url).json(body)).await?;
    rows
      .into_iter()
      .next()
      .ok_or_else(|| RemoteError::Rejected(format!("insert into {} returned no rows", table)))
  }

  async fn find_family_by_code(&self, code: &str) -> Result<Option<ApiFamilyRow>, RemoteError> {
    let rows: Vec<ApiFamilyRow> = self
      .select(FAMILIES_TABLE, &[("family_code", code)], None)
      .await?;
    Ok(rows.into_iter().next())
  }

  async fn add_member(
    &self,
    family_id: &str,
    nickname: &str,
    avatar: &str,
  ) -> Result<User, RemoteError> {
    let row: ApiMemberRow = self
      .insert(
        MEMBERS_TABLE,
        &ApiNewMember {
          family_id,
          nickname,
          avatar,
          last_seen: Utc::now(),
        },
      )
      .await?;
    Ok(row.into_user())
  }
}

fn require(value: &str, field: &'static str) -> Result<(), RemoteError> {
  if value.trim().is_empty() {
    return Err(ValidationError::MissingField(field).into());
  }
  Ok(())
}

#[async_trait]
impl RemoteStore for RestBackend {
  async fn fetch_list(&self, family_id: &str) -> Result<Vec<Item>, RemoteError> {
    let rows: Vec<ApiItemRow> = self
      .select(ITEMS_TABLE, &[("family_id", family_id)], Some("created_at.asc"))
      .await?;
    debug!(family_id, count = rows.len(), "fetched items");
    Ok(rows.into_iter().map(ApiItemRow::into_item).collect())
  }

  async fn create(&self, family_id: &str, item: &Item) -> Result<Item, RemoteError> {
    let row: ApiItemRow = self
      .insert(ITEMS_TABLE, &ApiNewItem::new(family_id, item))
      .await?;
    Ok(row.into_item())
  }

  async fn update(&self, family_id: &str, item: &Item) -> Result<bool, RemoteError> {
    let url = self.table_url(ITEMS_TABLE, &[("id", &item.id), ("family_id", family_id)])?;
    let rows: Vec<ApiItemRow> =
      Self::send(self.returning(Method::PATCH, url).json(&ApiItemPatch::from(item))).await?;
    Ok(!rows.is_empty())
  }

  async fn delete(&self, family_id: &str, item_id: &str) -> Result<bool, RemoteError> {
    let url = self.table_url(ITEMS_TABLE, &[("id", item_id), ("family_id", family_id)])?;
    let rows: Vec<ApiItemRow> = Self::send(self.returning(Method::DELETE, url)).await?;
    Ok(!rows.is_empty())
  }
}

#[async_trait]
impl FamilyDirectory for RestBackend {
  async fn create_family(
    &self,
    family_name: &str,
    nickname: &str,
    avatar: &str,
  ) -> Result<(Family, User), RemoteError> {
    require(family_name, "family name")?;
    require(nickname, "nickname")?;

    let mut code = None;
    for _ in 0..CODE_ATTEMPTS {
      let candidate = random_family_code();
      if self.find_family_by_code(&candidate).await?.is_none() {
        code = Some(candidate);
        break;
      }
      debug!(%candidate, "family code taken, retrying");
    }
    let code = code.ok_or_else(|| {
      RemoteError::Unavailable("could not allocate a free family code".to_string())
    })?;

    let row: ApiFamilyRow = self
      .insert(
        FAMILIES_TABLE,
        &ApiFamilyRow {
          id: String::new(),
          name: family_name.trim().to_string(),
          family_code: code,
        },
      )
      .await?;
    let user = self.add_member(&row.id, nickname.trim(), avatar).await?;
    info!(family = %row.name, code = %row.family_code, "family created");

    let member = user.clone().with_presence(Utc::now(), self.presence_window);
    Ok((row.into_family(vec![member]), user))
  }

  async fn join_family(
    &self,
    code: &str,
    nickname: &str,
    avatar: &str,
  ) -> Result<(Family, User), RemoteError> {
    let code = code.trim();
    if !is_valid_family_code(code) {
      return Err(ValidationError::InvalidFamilyCode.into());
    }
    require(nickname, "nickname")?;

    let row = self
      .find_family_by_code(code)
      .await?
      .ok_or_else(|| RemoteError::NotFound(format!("no family with code {}", code)))?;
    let user = self.add_member(&row.id, nickname.trim(), avatar).await?;
    let members = self.members_with_status(&row.id).await?;
    info!(family = %row.name, nickname = %user.nickname, "joined family");
    Ok((row.into_family(members), user))
  }

  async fn get_family(&self, family_id: &str) -> Result<Option<Family>, RemoteError> {
    let rows: Vec<ApiFamilyRow> = self
      .select(FAMILIES_TABLE, &[("id", family_id)], None)
      .await?;
    let Some(row) = rows.into_iter().next() else {
      return Ok(None);
    };
    let members = self.members_with_status(family_id).await?;
    Ok(Some(row.into_family(members)))
  }

  async fn members_with_status(&self, family_id: &str) -> Result<Vec<User>, RemoteError> {
    let rows: Vec<ApiMemberRow> = self
      .select(MEMBERS_TABLE, &[("family_id", family_id)], Some("nickname.asc"))
      .await?;
    let now = Utc::now();
    Ok(
      rows
        .into_iter()
        .map(|r| r.into_user().with_presence(now, self.presence_window))
        .collect(),
    )
  }

  async fn heartbeat(&self, family_id: &str, user_id: &str) -> Result<(), RemoteError> {
    let url = self.table_url(MEMBERS_TABLE, &[("id", user_id), ("family_id", family_id)])?;
    let body = ApiHeartbeat {
      last_seen: Utc::now(),
    };
    let rows: Vec<ApiMemberRow> = Self::send(self.returning(Method::PATCH, url).json(&body)).await?;
    if rows.is_empty() {
      warn!(family_id, user_id, "heartbeat matched no member");
      return Err(RemoteError::NotFound(format!("member {}", user_id)));
    }
    Ok(())
  }
}

#[async_trait]
impl Notifier for RestBackend {
  async fn notify_urgent(
    &self,
    family_id: &str,
    item_name: &str,
    actor_name: &str,
  ) -> Result<(), RemoteError> {
    let url = self.base.join("functions/v1/notify-urgent")?;
    let body = ApiUrgentNotice {
      family_id,
      item_name,
      actor_name,
    };
    Self::send_raw(self.request(Method::POST, url).json(&body)).await?;
    info!(family_id, item_name, "urgent notification requested");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::family::types::{NewItem, Priority};
  use serde_json::json;
  use wiremock::matchers::{body_partial_json, header, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn item_row(id: &str, name: &str, bought: bool) -> serde_json::Value {
    json!({
      "id": id,
      "name": name,
      "is_bought": bought,
      "priority": "normal",
      "added_by_user_id": "u1",
      "added_by_name": "Dad",
      "created_at": "2024-05-01T10:00:00Z",
      "bought_at": if bought { json!("2024-05-01T11:00:00Z") } else { json!(null) },
      "category": null,
      "quantity": null,
      "unit": null,
      "location": null,
      "archived": false
    })
  }

  async fn backend(server: &MockServer) -> RestBackend {
    RestBackend::new(&server.uri(), "fake-key").unwrap()
  }

  #[tokio::test]
  async fn test_fetch_list_filters_by_family() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/v1/shopping_items"))
      .and(query_param("family_id", "eq.fam1"))
      .and(query_param("select", "*"))
      .and(header("apikey", "fake-key"))
      .and(header("authorization", "Bearer fake-key"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        item_row("R1", "Milk", true),
        item_row("R2", "Eggs", false)
      ])))
      .mount(&server)
      .await;

    let items = backend(&server).await.fetch_list("fam1").await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, "R1");
    assert!(items[0].completed);
    assert!(items[0].completed_at.is_some());
    assert_eq!(items[1].completed_at, None);
  }

  #[tokio::test]
  async fn test_create_returns_server_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/rest/v1/shopping_items"))
      .and(header("Prefer", "return=representation"))
      .and(body_partial_json(json!({ "family_id": "fam1", "name": "Milk", "priority": "urgent" })))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!([item_row("R1", "Milk", false)])))
      .mount(&server)
      .await;

    let local = NewItem::new("Milk", "u1")
      .with_priority(Priority::Urgent)
      .into_pending(Utc::now());
    let created = backend(&server).await.create("fam1", &local).await.unwrap();
    assert_eq!(created.id, "R1");
    assert!(created.is_synced());
  }

  #[tokio::test]
  async fn test_update_reports_matched_rows() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
      .and(path("/rest/v1/shopping_items"))
      .and(query_param("id", "eq.R1"))
      .and(body_partial_json(json!({ "is_bought": true })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([item_row("R1", "Milk", true)])))
      .mount(&server)
      .await;
    Mock::given(method("PATCH"))
      .and(path("/rest/v1/shopping_items"))
      .and(query_param("id", "eq.R404"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .mount(&server)
      .await;

    let rest = backend(&server).await;
    let mut item = NewItem::new("Milk", "u1").into_pending(Utc::now());
    item.id = "R1".to_string();
    let done = item.toggled(Utc::now());
    assert!(rest.update("fam1", &done).await.unwrap());

    item.id = "R404".to_string();
    assert!(!rest.update("fam1", &item).await.unwrap());
  }

  #[tokio::test]
  async fn test_delete_and_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/rest/v1/shopping_items"))
      .and(query_param("id", "eq.R1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([item_row("R1", "Milk", false)])))
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path("/rest/v1/shopping_items"))
      .and(query_param("id", "eq.R2"))
      .respond_with(
        ResponseTemplate::new(500).set_body_json(json!({ "code": "XX000", "message": "boom" })),
      )
      .mount(&server)
      .await;

    let rest = backend(&server).await;
    assert!(rest.delete("fam1", "R1").await.unwrap());
    match rest.delete("fam1", "R2").await {
      Err(RemoteError::Http { status, message }) => {
        assert_eq!(status, 500);
        assert_eq!(message, "XX000: boom");
      }
      other => panic!("expected HTTP error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_unauthorized_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
      .mount(&server)
      .await;

    let result = backend(&server).await.fetch_list("fam1").await;
    assert!(matches!(result, Err(RemoteError::Rejected(m)) if m == "bad key"));
  }

  #[tokio::test]
  async fn test_join_family_by_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/rest/v1/families"))
      .and(query_param("family_code", "eq.123456"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        { "id": "fam1", "name": "Home", "family_code": "123456" }
      ])))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/rest/v1/families"))
      .and(query_param("family_code", "eq.999999"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/rest/v1/family_members"))
      .and(body_partial_json(json!({ "family_id": "fam1", "nickname": "Mom" })))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!([
        { "id": "u2", "nickname": "Mom", "avatar": null, "last_seen": Utc::now() }
      ])))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/rest/v1/family_members"))
      .and(query_param("family_id", "eq.fam1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([
        { "id": "u1", "nickname": "Dad", "avatar": "🧔", "last_seen": "2020-01-01T00:00:00Z" },
        { "id": "u2", "nickname": "Mom", "avatar": null, "last_seen": Utc::now() }
      ])))
      .mount(&server)
      .await;

    let rest = backend(&server).await;
    let (family, user) = rest.join_family("123456", "Mom", "").await.unwrap();
    assert_eq!(family.id, "fam1");
    assert_eq!(family.code, "123456");
    assert_eq!(user.id, "u2");
    let online: Vec<_> = family.members.iter().map(|m| m.is_online).collect();
    assert_eq!(online, vec![false, true]);

    assert!(matches!(
      rest.join_family("999999", "Mom", "").await,
      Err(RemoteError::NotFound(_))
    ));
    assert!(matches!(
      rest.join_family("12345", "Mom", "").await,
      Err(RemoteError::Validation(ValidationError::InvalidFamilyCode))
    ));
  }

  #[tokio::test]
  async fn test_notify_urgent_calls_edge_function() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/functions/v1/notify-urgent"))
      .and(body_partial_json(json!({ "item_name": "Eggs", "actor_name": "Mom" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sent": 2 })))
      .expect(1)
      .mount(&server)
      .await;

    backend(&server)
      .await
      .notify_urgent("fam1", "Eggs", "Mom")
      .await
      .unwrap();
  }

  #[test]
  fn test_base_url_keeps_path_prefix() {
    let rest = RestBackend::new("https://example.test/proxy", "k").unwrap();
    let url = rest.table_url(ITEMS_TABLE, &[("id", "R1")]).unwrap();
    assert_eq!(url.as_str(), "https://example.test/proxy/rest/v1/shopping_items?id=eq.R1");
  }
}
