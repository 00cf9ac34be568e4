//! 以 WebDriver 操作代管網站 UI：登入、開啟 repo 檔案編輯器、插入一行
//! 文字後提交。對應流程是固定的按鍵腳本，等待時間跟著頁面載入節奏走。

use clap::Parser;
use empulse::utils::{logger, validation::Validate};
use empulse::RepoEditConfig;
use fantoccini::{ClientBuilder, Locator};
use std::time::Duration;

const NAME_ENV: &str = "NAME";
const PASSWORD_ENV: &str = "PASSWORD";

const INSERTED_LINE: &str = "## 這是資料結構作業三自動輸入的測試文字";

fn repo_url(site: &str, user: &str, repo: &str) -> String {
    format!("{}/{}/{}", site.trim_end_matches('/'), user, repo)
}

/// 在 contenteditable 編輯器的最後一行之後插入一行。
fn insert_line_script(line: &str) -> String {
    format!(
        r#"
const editor = document.querySelector('div[contenteditable="true"]');
const newLine = document.createElement('div');
newLine.classList.add('cm-line');
newLine.setAttribute('dir', 'auto');
newLine.innerHTML = '{}';
const lastLine = editor.querySelector('.cm-line:last-child');
lastLine.parentNode.insertBefore(newLine, lastLine.nextSibling);
editor.scrollTop = editor.scrollHeight;
"#,
        line
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = RepoEditConfig::parse();

    logger::init_cli_logger(config.verbose);

    // 帳密從環境變數來，缺了就提示後正常結束
    let (Ok(name), Ok(password)) = (std::env::var(NAME_ENV), std::env::var(PASSWORD_ENV)) else {
        println!("請先在環境變數中設定 {} 和 {}", NAME_ENV, PASSWORD_ENV);
        return Ok(());
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let client = ClientBuilder::native()
        .connect(&config.webdriver_url)
        .await?;

    tracing::info!("啟動瀏覽器，前往登入頁面");
    client.goto(&format!("{}/login", config.site)).await?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    client
        .find(Locator::Css("input[name='login']"))
        .await?
        .send_keys(&name)
        .await?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    client
        .find(Locator::Css("input[name='password']"))
        .await?
        .send_keys(&password)
        .await?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    client
        .find(Locator::Css("input[type='submit']"))
        .await?
        .click()
        .await?;
    tokio::time::sleep(Duration::from_secs(3)).await;

    let url = repo_url(&config.site, &name, &config.repo);
    tracing::info!("前往 {}", url);
    client.goto(&url).await?;

    // 等鉛筆圖標出現再點
    client
        .wait()
        .at_most(Duration::from_secs(10))
        .for_element(Locator::Css("button[aria-label='Edit file']"))
        .await?
        .click()
        .await?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    client
        .wait()
        .at_most(Duration::from_secs(5))
        .for_element(Locator::Css("div[contenteditable='true']"))
        .await?;

    client
        .execute(&insert_line_script(INSERTED_LINE), vec![])
        .await?;

    client
        .find(Locator::XPath("//button[contains(., 'Commit changes...')]"))
        .await?
        .click()
        .await?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    // 確認對話框上的提交按鈕
    client
        .find(Locator::XPath(
            "//div[@role='dialog']//button[contains(., 'Commit changes')]",
        ))
        .await?
        .click()
        .await?;
    tokio::time::sleep(Duration::from_secs(5)).await;

    println!("✅ 變更已成功提交");

    client.close().await?;
    Ok(())
}
