//! Custom menu endpoints

use serde::{Deserialize, Serialize};

use super::client::ApiClient;
use crate::auth::CredentialIssuer;
use crate::error::{Result, WebhookError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonType {
    Click,
    View,
    ScancodeWaitmsg,
    ScancodePush,
    PicSysphoto,
    PicPhotoOrAlbum,
    PicWeixin,
    LocationSelect,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MenuButton {
    /// Absent on buttons that only open a sub menu.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ButtonType>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_button: Vec<MenuButton>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Menu {
    #[serde(default)]
    pub button: Vec<MenuButton>,
}

#[derive(Debug, Deserialize)]
struct MenuResponse {
    menu: Option<Menu>,
}

impl<I: CredentialIssuer> ApiClient<I> {
    pub async fn create_menu(&self, menu: &Menu) -> Result<()> {
        self.post("/menu/create", menu).await?;
        tracing::info!("Menu created with {} top-level buttons", menu.button.len());
        Ok(())
    }

    pub async fn get_menu(&self) -> Result<Menu> {
        let value = self.get("/menu/get").await?;
        parse_menu(value)
    }

    pub async fn delete_menu(&self) -> Result<()> {
        self.get("/menu/delete").await?;
        tracing::info!("Menu deleted");
        Ok(())
    }
}

fn parse_menu(value: serde_json::Value) -> Result<Menu> {
    let resp: MenuResponse = serde_json::from_value(value)
        .map_err(|e| WebhookError::Decode(format!("menu response: {}", e)))?;
    resp.menu
        .ok_or_else(|| WebhookError::Decode("menu response has no menu".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_menu() -> Menu {
        Menu {
            button: vec![
                MenuButton {
                    kind: Some(ButtonType::Click),
                    name: "Today".into(),
                    key: Some("V1001_TODAY_MUSIC".into()),
                    ..Default::default()
                },
                MenuButton {
                    name: "More".into(),
                    sub_button: vec![
                        MenuButton {
                            kind: Some(ButtonType::View),
                            name: "Search".into(),
                            url: Some("http://www.soso.com/".into()),
                            ..Default::default()
                        },
                        MenuButton {
                            kind: Some(ButtonType::ScancodeWaitmsg),
                            name: "Scan".into(),
                            key: Some("rselfmenu_0_0".into()),
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn test_menu_json_shape() {
        let json = serde_json::to_value(sample_menu()).unwrap();
        assert_eq!(json["button"][0]["type"], "click");
        assert_eq!(json["button"][0]["key"], "V1001_TODAY_MUSIC");
        assert!(json["button"][0].get("sub_button").is_none());
        assert!(json["button"][1].get("type").is_none());
        assert_eq!(json["button"][1]["sub_button"][1]["type"], "scancode_waitmsg");
        assert_eq!(json["button"][1]["sub_button"][0]["url"], "http://www.soso.com/");
    }

    #[test]
    fn test_parse_get_response() {
        let value = serde_json::json!({
            "menu": {
                "button": [
                    {"type": "click", "name": "Today", "key": "V1001_TODAY_MUSIC", "sub_button": []},
                    {"name": "More", "sub_button": [
                        {"type": "view", "name": "Search", "url": "http://www.soso.com/", "sub_button": []},
                        {"type": "scancode_waitmsg", "name": "Scan", "key": "rselfmenu_0_0", "sub_button": []}
                    ]}
                ]
            }
        });
        assert_eq!(parse_menu(value).unwrap(), sample_menu());
    }

    #[test]
    fn test_parse_missing_menu() {
        assert!(parse_menu(serde_json::json!({"errcode": 0})).is_err());
    }

    #[test]
    fn test_all_button_types() {
        let names = [
            "click",
            "view",
            "scancode_waitmsg",
            "scancode_push",
            "pic_sysphoto",
            "pic_photo_or_album",
            "pic_weixin",
            "location_select",
        ];
        for name in names {
            let parsed: ButtonType = serde_json::from_value(serde_json::json!(name)).unwrap();
            assert_eq!(serde_json::to_value(parsed).unwrap(), name);
        }
    }
}
