//! Application descriptor (`Application.xml`) rendering and editing

use crate::artifacts::{ApplicationParams, CREDENTIAL_FILE};
use crate::error::TemplateError;
use crate::macros::{self, APPLICATION, APPLICATION_INSTANCE, SOURCE_STREAM_NAME, VHOST_CONFIG_HOME};
use crate::property::{self, Property, PropertyValue};

/// Properties that both carry the publish bandwidth limit
pub const BANDWIDTH_PROPERTIES: [&str; 2] = ["limitPublishedStreamBandwidthMaxBitrate", "MaxBitrate"];

/// Properties that both carry the viewer cap
pub const VIEWER_PROPERTIES: [&str; 2] = [
    "limitStreamViewersMaxViewers",
    "securityPlayMaximumConnections",
];

/// A property whose value an edit actually changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    pub name: String,
    pub old: String,
    pub new: String,
}

fn application_properties(params: &ApplicationParams) -> Vec<Property> {
    let bandwidth = i64::from(params.bandwidth_kbps);
    let viewers = i64::from(params.max_viewers);

    vec![
        Property::integer(BANDWIDTH_PROPERTIES[0], bandwidth),
        Property::boolean("limitPublishedStreamBandwidthDebugLog", true),
        Property::integer(BANDWIDTH_PROPERTIES[1], bandwidth),
        Property::boolean("StreamMonitorLogging", true),
        Property::integer(VIEWER_PROPERTIES[0], viewers),
        Property::integer(VIEWER_PROPERTIES[1], viewers),
        Property::boolean("securityPublishRequirePassword", true),
        Property::string("streamPublisherSmilFile", "playlists_agendamentos.smil"),
        Property::boolean("streamPublisherPassMetaData", true),
        Property::boolean("streamPublisherSwitchLog", true),
        Property::boolean("securityPublishBlockDuplicateStreamNames", false),
        Property::string(
            "securityPublishPasswordFile",
            format!("{VHOST_CONFIG_HOME}/conf/{APPLICATION}/{CREDENTIAL_FILE}"),
        ),
        Property::string("loopUntilLiveSourceStreams", "live"),
        Property::string("loopUntilLiveOutputStreams", params.name.as_str()),
        Property::boolean("loopUntilLiveReloadEntirePlaylist", true),
        Property::boolean("loopUntilLiveHandleMediaCasters", false),
        Property::string(
            "pushPublishMapPath",
            format!("{VHOST_CONFIG_HOME}/conf/{APPLICATION}/PushPublishMap.txt"),
        ),
    ]
}

const MODULES: [(&str, &str, &str); 8] = [
    ("base", "Base", "com.wowza.wms.module.ModuleCore"),
    ("logging", "Client Logging", "com.wowza.wms.module.ModuleClientLogging"),
    ("flvplayback", "FLVPlayback", "com.wowza.wms.module.ModuleFLVPlayback"),
    (
        "ModuleCoreSecurity",
        "Core Security Module for Applications",
        "com.wowza.wms.security.ModuleCoreSecurity",
    ),
    (
        "streamPublisher",
        "Playlists",
        "com.wowza.wms.plugin.streampublisher.ModuleStreamPublisher",
    ),
    (
        "ModuleLoopUntilLive",
        "ModuleLoopUntilLive",
        "com.wowza.wms.plugin.streampublisher.ModuleLoopUntilLive",
    ),
    (
        "ModuleLimitPublishedStreamBandwidth",
        "Monitors limit of published stream bandwidth.",
        "com.wowza.wms.plugin.ModuleLimitPublishedStreamBandwidth",
    ),
    (
        "ModulePushPublish",
        "ModulePushPublish",
        "com.wowza.wms.pushpublish.module.ModulePushPublish",
    ),
];

fn render_modules() -> String {
    MODULES
        .iter()
        .map(|(name, description, class)| {
            format!(
                "      <Module>\n        <Name>{name}</Name>\n        <Description>{description}</Description>\n        <Class>{class}</Class>\n      </Module>\n"
            )
        })
        .collect()
}

/// Render the full descriptor for one tenant application
///
/// Built in two passes: the document is assembled with placeholder tokens,
/// then [`macros::expand`] turns them into real path macros.
#[must_use]
pub fn render_descriptor(params: &ApplicationParams) -> String {
    let name = property::xml_escape(&params.name);
    let storage_dir = property::xml_escape(&params.storage_dir);
    let ice_address = property::xml_escape(&params.host_address);
    let modules = render_modules();
    let properties = property::render_list(&application_properties(params), 6);
    let http_streamer = property::render_list(&[Property::integer("cupertinoPlaylistProgramId", 1)], 8);

    let draft = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Root version="1">
  <Application>
    <Name>{name}</Name>
    <AppType>Live</AppType>
    <Description>Streaming application provisioned for {name}</Description>
    <Connections>
      <AutoAccept>true</AutoAccept>
      <AllowDomains></AllowDomains>
    </Connections>
    <Streams>
      <StreamType>live</StreamType>
      <StorageDir>{storage_dir}</StorageDir>
      <KeyDir>{VHOST_CONFIG_HOME}/keys</KeyDir>
      <LiveStreamPacketizers>cupertinostreamingpacketizer, mpegdashstreamingpacketizer, sanjosestreamingpacketizer, smoothstreamingpacketizer</LiveStreamPacketizers>
      <Properties>
      </Properties>
    </Streams>
    <Transcoder>
      <LiveStreamTranscoder></LiveStreamTranscoder>
      <Templates>{SOURCE_STREAM_NAME}.xml,transrate.xml</Templates>
      <ProfileDir>{VHOST_CONFIG_HOME}/transcoder/profiles</ProfileDir>
      <TemplateDir>{VHOST_CONFIG_HOME}/transcoder/templates</TemplateDir>
      <Properties>
      </Properties>
    </Transcoder>
    <DVR>
      <Recorders></Recorders>
      <Store></Store>
      <WindowDuration>0</WindowDuration>
      <StorageDir>{VHOST_CONFIG_HOME}/dvr</StorageDir>
      <ArchiveStrategy>append</ArchiveStrategy>
      <Properties>
      </Properties>
    </DVR>
    <TimedText>
      <VODTimedTextProviders></VODTimedTextProviders>
      <Properties>
      </Properties>
    </TimedText>
    <HTTPStreamers>cupertinostreaming, smoothstreaming, sanjosestreaming, mpegdashstreaming</HTTPStreamers>
    <MediaCache>
      <MediaCacheSourceList></MediaCacheSourceList>
    </MediaCache>
    <SharedObjects>
      <StorageDir>{VHOST_CONFIG_HOME}/applications/{APPLICATION}/sharedobjects/{APPLICATION_INSTANCE}</StorageDir>
    </SharedObjects>
    <Client>
      <IdleFrequency>-1</IdleFrequency>
      <Access>
        <StreamReadAccess>*</StreamReadAccess>
        <StreamWriteAccess>*</StreamWriteAccess>
        <StreamAudioSampleAccess></StreamAudioSampleAccess>
        <StreamVideoSampleAccess></StreamVideoSampleAccess>
        <SharedObjectReadAccess>*</SharedObjectReadAccess>
        <SharedObjectWriteAccess>*</SharedObjectWriteAccess>
      </Access>
    </Client>
    <RTP>
      <Authentication>
        <PublishMethod>digest</PublishMethod>
        <PlayMethod>none</PlayMethod>
      </Authentication>
      <AVSyncMethod>senderreport</AVSyncMethod>
      <MaxRTCPWaitTime>12000</MaxRTCPWaitTime>
      <IdleFrequency>75</IdleFrequency>
      <RTSPSessionTimeout>90000</RTSPSessionTimeout>
      <RTSPMaximumPendingWriteBytes>0</RTSPMaximumPendingWriteBytes>
      <RTSPBindIpAddress></RTSPBindIpAddress>
      <RTSPConnectionIpAddress>0.0.0.0</RTSPConnectionIpAddress>
      <RTSPOriginIpAddress>127.0.0.1</RTSPOriginIpAddress>
      <IncomingDatagramPortRanges>*</IncomingDatagramPortRanges>
      <Properties>
      </Properties>
    </RTP>
    <WebRTC>
      <EnablePublish>true</EnablePublish>
      <EnablePlay>true</EnablePlay>
      <EnableQuery>true</EnableQuery>
      <IceCandidateIpAddresses>{ice_address},tcp,1935</IceCandidateIpAddresses>
      <UDPBindAddress></UDPBindAddress>
      <PreferredCodecsAudio>opus,vorbis,pcmu,pcma</PreferredCodecsAudio>
      <PreferredCodecsVideo>vp8,h264</PreferredCodecsVideo>
      <DebugLog>false</DebugLog>
      <Properties>
      </Properties>
    </WebRTC>
    <MediaCaster>
      <RTP>
        <RTSP>
          <RTPTransportMode>interleave</RTPTransportMode>
        </RTSP>
      </RTP>
      <StreamValidator>
        <Enable>true</Enable>
        <ResetNameGroups>true</ResetNameGroups>
        <StreamStartTimeout>20000</StreamStartTimeout>
        <StreamTimeout>12000</StreamTimeout>
        <VideoStartTimeout>0</VideoStartTimeout>
        <VideoTimeout>0</VideoTimeout>
        <AudioStartTimeout>0</AudioStartTimeout>
        <AudioTimeout>0</AudioTimeout>
        <VideoTCToleranceEnable>false</VideoTCToleranceEnable>
        <VideoTCPosTolerance>3000</VideoTCPosTolerance>
        <VideoTCNegTolerance>-500</VideoTCNegTolerance>
        <AudioTCToleranceEnable>false</AudioTCToleranceEnable>
        <AudioTCPosTolerance>3000</AudioTCPosTolerance>
        <AudioTCNegTolerance>-500</AudioTCNegTolerance>
        <DataTCToleranceEnable>false</DataTCToleranceEnable>
        <DataTCPosTolerance>3000</DataTCPosTolerance>
        <DataTCNegTolerance>-500</DataTCNegTolerance>
        <AVSyncToleranceEnable>false</AVSyncToleranceEnable>
        <AVSyncTolerance>1500</AVSyncTolerance>
        <DebugLog>false</DebugLog>
      </StreamValidator>
      <Properties>
      </Properties>
    </MediaCaster>
    <MediaReader>
      <Properties>
      </Properties>
    </MediaReader>
    <MediaWriter>
      <Properties>
      </Properties>
    </MediaWriter>
    <LiveStreamPacketizer>
      <Properties>
      </Properties>
    </LiveStreamPacketizer>
    <HTTPStreamer>
      <Properties>
{http_streamer}      </Properties>
    </HTTPStreamer>
    <HTTPProvider>
      <BaseClass>com.wowza.wms.plugin.HTTPStreamControl</BaseClass>
      <RequestFilters>streamcontrol*</RequestFilters>
      <AuthenticationMethod>none</AuthenticationMethod>
    </HTTPProvider>
    <Manager>
      <Properties>
      </Properties>
    </Manager>
    <Repeater>
      <OriginURL></OriginURL>
      <QueryString><![CDATA[]]></QueryString>
    </Repeater>
    <StreamRecorder>
      <Properties>
      </Properties>
    </StreamRecorder>
    <Modules>
{modules}    </Modules>
    <Properties>
{properties}    </Properties>
  </Application>
</Root>
"#
    );

    macros::expand(&draft)
}

/// Byte span of one `<Property>` block's `<Value>` body
fn value_span(xml: &str, name: &str) -> Result<(usize, usize), TemplateError> {
    let needle = format!("<Name>{}</Name>", property::xml_escape(name));
    let mut search_from = 0;

    while let Some(rel) = xml[search_from..].find(&needle) {
        let name_at = search_from + rel;
        search_from = name_at + needle.len();

        // only names that sit inside a <Property> block count
        let block_start = xml[..name_at].rfind("<Property>");
        let block_close = xml[..name_at].rfind("</Property>");
        let in_block = match (block_start, block_close) {
            (Some(open), Some(close)) => open > close,
            (Some(_), None) => true,
            _ => false,
        };
        if !in_block {
            continue;
        }

        let block_end = xml[search_from..]
            .find("</Property>")
            .map(|i| search_from + i)
            .ok_or_else(|| TemplateError::MalformedProperty(name.to_string()))?;
        let block = &xml[search_from..block_end];

        let open = block
            .find("<Value>")
            .ok_or_else(|| TemplateError::MalformedProperty(name.to_string()))?;
        let body_start = search_from + open + "<Value>".len();
        let close = xml[body_start..block_end]
            .find("</Value>")
            .ok_or_else(|| TemplateError::MalformedProperty(name.to_string()))?;

        return Ok((body_start, body_start + close));
    }

    Err(TemplateError::PropertyNotFound(name.to_string()))
}

/// Current value of a named property
///
/// # Errors
/// Returns `PropertyNotFound` or `MalformedProperty`
pub fn read_property(xml: &str, name: &str) -> Result<String, TemplateError> {
    let (start, end) = value_span(xml, name)?;
    Ok(xml[start..end].trim().to_string())
}

/// Set several properties, returning the new document and what changed
///
/// Only the `<Value>` bodies are touched; layout and every other element are
/// preserved byte for byte. Properties already holding the requested value
/// produce no change entry.
///
/// # Errors
/// Returns `PropertyNotFound` or `MalformedProperty` for the first property
/// that cannot be located
pub fn set_properties(
    xml: &str,
    updates: &[(&str, PropertyValue)],
) -> Result<(String, Vec<PropertyChange>), TemplateError> {
    let mut doc = xml.to_string();
    let mut changes = Vec::new();

    for (name, value) in updates {
        let (start, end) = value_span(&doc, name)?;
        let old = doc[start..end].trim().to_string();
        let new = value.to_string();
        if old == new {
            continue;
        }
        doc.replace_range(start..end, &new);
        changes.push(PropertyChange {
            name: (*name).to_string(),
            old,
            new,
        });
    }

    Ok((doc, changes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ApplicationParams {
        ApplicationParams {
            name: "acct1".to_string(),
            host_address: "10.0.0.5".to_string(),
            bandwidth_kbps: 4500,
            max_viewers: 999_999,
            publish_secret: "s3cret".to_string(),
            storage_dir: "/home/streaming/acct1".to_string(),
        }
    }

    #[test]
    fn test_descriptor_carries_limits_twice() {
        let xml = render_descriptor(&params());

        for name in BANDWIDTH_PROPERTIES {
            assert_eq!(read_property(&xml, name).unwrap(), "4500");
        }
        for name in VIEWER_PROPERTIES {
            assert_eq!(read_property(&xml, name).unwrap(), "999999");
        }
        assert_eq!(
            read_property(&xml, "securityPublishRequirePassword").unwrap(),
            "true"
        );
    }

    #[test]
    fn test_descriptor_expands_macros() {
        let xml = render_descriptor(&params());

        assert!(!macros::has_placeholders(&xml));
        assert!(!xml.contains("__"));
        assert_eq!(
            read_property(&xml, "securityPublishPasswordFile").unwrap(),
            "${com.wowza.wms.context.VHostConfigHome}/conf/${com.wowza.wms.context.Application}/publish.password"
        );
        assert!(xml.contains(
            "sharedobjects/${com.wowza.wms.context.ApplicationInstance}</StorageDir>"
        ));
        assert!(xml.contains("<Templates>${SourceStreamName}.xml,transrate.xml</Templates>"));
        assert!(xml.contains("<IceCandidateIpAddresses>10.0.0.5,tcp,1935</IceCandidateIpAddresses>"));
        assert!(xml.contains("<StorageDir>/home/streaming/acct1</StorageDir>"));
    }

    #[test]
    fn test_module_names_are_not_properties() {
        let xml = render_descriptor(&params());
        // "base" appears as a module <Name>, not inside a <Property>
        assert_eq!(
            read_property(&xml, "base"),
            Err(TemplateError::PropertyNotFound("base".to_string()))
        );
    }

    #[test]
    fn test_set_properties_reports_diff() {
        let xml = render_descriptor(&params());
        let updates: Vec<(&str, PropertyValue)> = BANDWIDTH_PROPERTIES
            .iter()
            .map(|n| (*n, PropertyValue::Integer(2500)))
            .chain(VIEWER_PROPERTIES.iter().map(|n| (*n, PropertyValue::Integer(999_999))))
            .collect();

        let (edited, changes) = set_properties(&xml, &updates).unwrap();

        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.old == "4500" && c.new == "2500"));
        assert_eq!(read_property(&edited, "MaxBitrate").unwrap(), "2500");
        assert_eq!(
            read_property(&edited, "limitStreamViewersMaxViewers").unwrap(),
            "999999"
        );
        assert_eq!(edited.len(), xml.len());
    }

    #[test]
    fn test_set_properties_tolerates_reformatted_blocks() {
        let xml = "<Properties><Property><Name>MaxBitrate</Name>\n\n   <Value> 100 </Value><Type>Integer</Type></Property></Properties>";

        let (edited, changes) =
            set_properties(xml, &[("MaxBitrate", PropertyValue::Integer(200))]).unwrap();

        assert_eq!(changes[0].old, "100");
        assert!(edited.contains("<Value>200</Value>"));
    }

    #[test]
    fn test_set_unknown_property() {
        let xml = render_descriptor(&params());
        let err = set_properties(&xml, &[("noSuchThing", PropertyValue::Boolean(true))]).unwrap_err();
        assert_eq!(err, TemplateError::PropertyNotFound("noSuchThing".to_string()));
    }
}
